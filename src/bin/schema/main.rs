use env_logger::Env;
use sea_orm::ConnectionTrait;
use socialdb::db::{connect, DbConfig};
use socialdb::schema::{create_tables, drop_tables, table_statements};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let drop = match std::env::args().nth(1).as_deref() {
        None | Some("create") => false,
        Some("drop") => true,
        Some(other) => anyhow::bail!("unknown command {:?} (expected `create` or `drop`)", other),
    };

    let config = DbConfig::from_env()?;
    let db = connect(&config).await?;

    if drop {
        drop_tables(&db).await?;
    } else {
        for stmt in table_statements(db.get_database_backend()) {
            log::info!("{}", stmt);
        }
        create_tables(&db).await?;
    }

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is fine; the variables may come from the environment.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
