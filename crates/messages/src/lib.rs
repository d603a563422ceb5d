//! Chat message log.
//!
//! Every message a visitor sends, every canned reply, every operator answer
//! (from Telegram or the admin panel) is appended here. The website polls it
//! with an id cursor; the admin panel reads it per conversation.

pub mod error;
pub mod model;
pub mod store;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    model::{ChatMessage, ConversationSummary, NewMessage},
    store::MessageStore,
    store_sqlite::SqliteMessageStore,
};

/// Run database migrations for the messages crate.
///
/// Creates the `chat_messages` table. Call at startup before constructing
/// [`SqliteMessageStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
