use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::error::AppResult;

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(max_connections.max(1)).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;

    // sqlx turns foreign keys on for every pooled connection; this one is checked below.
    pragma(&db, "PRAGMA foreign_keys = ON").await?;
    pragma(&db, "PRAGMA journal_mode=WAL").await?;
    pragma(&db, "PRAGMA synchronous=NORMAL").await?;

    ensure_foreign_keys(&db).await?;

    Migrator::up(&db, None).await.context("running migrations")?;
    info!(url = %database_url, "database ready");

    Ok(db)
}

async fn pragma(db: &DatabaseConnection, sql: &str) -> AppResult<()> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string())).await?;
    Ok(())
}

/// Link rows must never point at a missing movie, so refuse to run without enforcement.
async fn ensure_foreign_keys(db: &DatabaseConnection) -> AppResult<()> {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_keys".to_string(),
        ))
        .await?
        .context("PRAGMA foreign_keys returned no row")?;

    let enabled: i32 = row.try_get_by_index(0)?;
    if enabled != 1 {
        return Err(anyhow::anyhow!("sqlite foreign key enforcement is unavailable").into());
    }
    Ok(())
}
