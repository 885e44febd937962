use crate::error::Result;
use crate::orm::{comments, media, posts, users};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, TransactionTrait};

#[derive(Debug)]
pub struct NewPost<'a> {
    pub user_id: i32,
    pub caption: Option<&'a str>,
    pub location: Option<&'a str>,
}

pub async fn insert_new_post<C: ConnectionTrait>(db: &C, new: &NewPost<'_>) -> Result<posts::Model> {
    let post = posts::ActiveModel {
        user_id: Set(new.user_id),
        caption: Set(new.caption.map(str::to_owned)),
        location: Set(new.location.map(str::to_owned)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::debug!("insert_new_post: user {} created post {}", post.user_id, post.id);
    Ok(post)
}

pub async fn get_post_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<posts::Model>> {
    Ok(posts::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_author_of_post<C: ConnectionTrait>(
    db: &C,
    post: &posts::Model,
) -> Result<Option<users::Model>> {
    Ok(post.find_related(users::Entity).one(db).await?)
}

/// Returns comments on a post, oldest first.
pub async fn get_comments_for_post<C: ConnectionTrait>(
    db: &C,
    post: &posts::Model,
) -> Result<Vec<comments::Model>> {
    Ok(post
        .find_related(comments::Entity)
        .order_by_asc(comments::Column::Id)
        .all(db)
        .await?)
}

/// Returns media attached to a post in upload order.
pub async fn get_media_for_post<C: ConnectionTrait>(
    db: &C,
    post: &posts::Model,
) -> Result<Vec<media::Model>> {
    Ok(post
        .find_related(media::Entity)
        .order_by_asc(media::Column::Id)
        .all(db)
        .await?)
}

/// Deletes a post with its comments and media in one transaction.
/// Returns false if no such post existed.
pub async fn delete_post(db: &DatabaseConnection, id: i32) -> Result<bool> {
    let txn = db.begin().await?;

    media::Entity::delete_many()
        .filter(media::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    comments::Entity::delete_many()
        .filter(comments::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    let res = posts::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(res.rows_affected > 0)
}
