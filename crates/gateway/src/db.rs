//! Database pool and schema management shared by `gateway` and `db`.

use std::str::FromStr;

use {
    buran_config::BuranConfig,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    },
    tracing::{debug, info},
};

/// Tables emptied by [`reset`].
const DATA_TABLES: &[&str] = &["chat_messages", "settings", "leads"];

/// Open the SQLite pool, creating the data directory and file when needed.
pub async fn connect(config: &BuranConfig) -> anyhow::Result<SqlitePool> {
    let data_dir = buran_config::data_dir();
    if config.database.url.is_none() {
        std::fs::create_dir_all(&data_dir)?;
    }
    let url = config.database.resolved_url(&data_dir);
    debug!(url = %url, "opening database");

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run every crate's migrations.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    buran_messages::run_migrations(pool).await?;
    buran_settings::run_migrations(pool).await?;
    buran_leads::run_migrations(pool).await?;
    info!("database migrations applied");
    Ok(())
}

/// Delete all chat messages, settings and leads. The schema is kept.
pub async fn reset(pool: &SqlitePool) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;
    for table in DATA_TABLES {
        deleted += sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;
    info!(deleted, "database reset");
    Ok(deleted)
}
