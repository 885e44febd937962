//! Registration of the four tables with the database.
//!
//! DDL is written out by hand with `sea_query` rather than derived from the
//! entities so that the cascade rules, index names and the media type CHECK
//! constraint are identical on every backend.

use crate::error::Result;
use crate::orm::media::MediaType;
use crate::orm::{comments, media, posts, users};
use sea_orm::sea_query::{
    ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, SimpleExpr, Table,
    TableCreateStatement, TableDropStatement,
};
use sea_orm::{
    ActiveEnum, ConnectionTrait, DatabaseConnection, DbBackend, Iterable, Statement,
    TransactionTrait,
};

/// Storage default for `created_at`. Columns hold naive UTC, so the server
/// clock must be read in UTC whatever the session time zone is.
fn utc_now(backend: DbBackend) -> SimpleExpr {
    match backend {
        DbBackend::Postgres => Expr::cust("timezone('utc', now())"),
        DbBackend::MySql => Expr::cust("(UTC_TIMESTAMP())"),
        // SQLite's CURRENT_TIMESTAMP is always UTC.
        DbBackend::Sqlite => Expr::current_timestamp().into(),
    }
}

fn user_table(backend: DbBackend) -> TableCreateStatement {
    Table::create()
        .table(users::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(users::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(users::Column::Email)
                .string_len(120)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(users::Column::Username)
                .string_len(50)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(users::Column::Password).text().not_null())
        .col(
            ColumnDef::new(users::Column::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(users::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(utc_now(backend)),
        )
        .to_owned()
}

fn post_table(backend: DbBackend) -> TableCreateStatement {
    Table::create()
        .table(posts::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(posts::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(posts::Column::UserId).integer().not_null())
        .col(ColumnDef::new(posts::Column::Caption).text().null())
        .col(ColumnDef::new(posts::Column::Location).string_len(120).null())
        .col(
            ColumnDef::new(posts::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(utc_now(backend)),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk-post-user_id")
                .from(posts::Entity, posts::Column::UserId)
                .to(users::Entity, users::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::NoAction),
        )
        .to_owned()
}

fn comment_table(backend: DbBackend) -> TableCreateStatement {
    Table::create()
        .table(comments::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(comments::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(comments::Column::PostId).integer().not_null())
        .col(ColumnDef::new(comments::Column::UserId).integer().not_null())
        .col(ColumnDef::new(comments::Column::Body).text().not_null())
        .col(
            ColumnDef::new(comments::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(utc_now(backend)),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk-comment-post_id")
                .from(comments::Entity, comments::Column::PostId)
                .to(posts::Entity, posts::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::NoAction),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk-comment-user_id")
                .from(comments::Entity, comments::Column::UserId)
                .to(users::Entity, users::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::NoAction),
        )
        .to_owned()
}

fn media_table() -> TableCreateStatement {
    Table::create()
        .table(media::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(media::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(media::Column::PostId).integer().not_null())
        .col(
            ColumnDef::new(media::Column::MediaType)
                .string_len(5)
                .not_null()
                .check(
                    Expr::col(media::Column::MediaType)
                        .is_in(MediaType::iter().map(|kind| kind.to_value())),
                ),
        )
        .col(ColumnDef::new(media::Column::Url).string_len(300).not_null())
        .foreign_key(
            ForeignKey::create()
                .name("fk-media-post_id")
                .from(media::Entity, media::Column::PostId)
                .to(posts::Entity, posts::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::NoAction),
        )
        .to_owned()
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx-post-user_id")
            .table(posts::Entity)
            .col(posts::Column::UserId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx-comment-post_id")
            .table(comments::Entity)
            .col(comments::Column::PostId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx-comment-user_id")
            .table(comments::Entity)
            .col(comments::Column::UserId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx-media-post_id")
            .table(media::Entity)
            .col(media::Column::PostId)
            .to_owned(),
    ]
}

/// Child tables first, so foreign keys never point at a missing table.
fn drops() -> Vec<TableDropStatement> {
    vec![
        Table::drop().table(media::Entity).if_exists().to_owned(),
        Table::drop().table(comments::Entity).if_exists().to_owned(),
        Table::drop().table(posts::Entity).if_exists().to_owned(),
        Table::drop().table(users::Entity).if_exists().to_owned(),
    ]
}

fn create_statements(backend: DbBackend) -> Vec<Statement> {
    let mut stmts: Vec<Statement> = [
        user_table(backend),
        post_table(backend),
        comment_table(backend),
        media_table(),
    ]
        .iter()
        .map(|table| backend.build(table))
        .collect();
    stmts.extend(indexes().iter().map(|index| backend.build(index)));
    stmts
}

/// Returns the rendered CREATE statements for the given backend, in execution order.
pub fn table_statements(backend: DbBackend) -> Vec<String> {
    create_statements(backend)
        .iter()
        .map(|stmt| stmt.to_string())
        .collect()
}

/// Creates every table and index that does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let txn = db.begin().await?;
    for stmt in create_statements(backend) {
        log::debug!("create_tables: {}", stmt);
        txn.execute(stmt).await?;
    }
    txn.commit().await?;
    log::info!("schema registered");
    Ok(())
}

/// Drops all four tables.
pub async fn drop_tables(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let txn = db.begin().await?;
    for stmt in drops() {
        let stmt = backend.build(&stmt);
        log::debug!("drop_tables: {}", stmt);
        txn.execute(stmt).await?;
    }
    txn.commit().await?;
    log::info!("schema dropped");
    Ok(())
}
