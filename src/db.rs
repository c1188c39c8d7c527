use migration::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::error::CatalogResult;

pub async fn connect_and_migrate(database_url: &str) -> CatalogResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        // Every pooled connection to an in-memory database is a separate database.
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;

    pragma(&db, "PRAGMA foreign_keys=ON").await?;
    if !database_url.contains(":memory:") {
        pragma(&db, "PRAGMA journal_mode=WAL").await?;
        pragma(&db, "PRAGMA synchronous=NORMAL").await?;
    }

    Migrator::up(&db, None).await?;
    Ok(db)
}

async fn pragma(db: &DatabaseConnection, sql: &str) -> CatalogResult<()> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string())).await?;
    Ok(())
}
