//! Persistence trait for chat messages.

use {
    async_trait::async_trait,
    buran_common::{Page, PageRequest},
};

use crate::{
    Result,
    model::{ChatMessage, ConversationSummary, NewMessage},
};

/// Ordered message log, keyed by visitor id.
///
/// Per visitor, messages are ordered by `(created_at, id)` ascending. Only
/// the read flag is ever mutated after insertion.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, assigning its id and timestamp.
    async fn append(&self, message: NewMessage) -> Result<ChatMessage>;

    /// Messages of `user_id` with `id > last_id`, oldest first, at most `limit`.
    async fn list_since(&self, user_id: &str, last_id: i64, limit: u32)
    -> Result<Vec<ChatMessage>>;

    /// One page of a conversation, oldest first.
    async fn history(&self, user_id: &str, page: PageRequest)
    -> Result<Page<ChatMessage>>;

    /// Flag one message as read. Returns `false` when the id is unknown.
    async fn mark_read(&self, id: i64) -> Result<bool>;

    /// Flag every unread visitor message of `user_id` as read.
    async fn mark_user_messages_read(&self, user_id: &str) -> Result<u64>;

    /// Remove all messages of `user_id`. Returns the number removed.
    async fn delete_conversation(&self, user_id: &str) -> Result<u64>;

    /// Unread visitor messages across all conversations.
    async fn unread_count(&self) -> Result<i64>;

    /// One summary per visitor, most recently active first.
    async fn conversations(&self) -> Result<Vec<ConversationSummary>>;
}
