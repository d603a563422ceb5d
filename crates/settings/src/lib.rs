//! Site settings persisted as JSON documents keyed by name.

pub mod error;
pub mod store;

pub use {
    error::{Error, Result},
    store::SettingsStore,
};

/// Run database migrations for the settings crate.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
