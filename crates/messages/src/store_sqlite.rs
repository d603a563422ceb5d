//! SQLite-backed message store using sqlx.

use {
    async_trait::async_trait,
    buran_common::{Page, PageRequest, now_ms},
    sqlx::SqlitePool,
    tracing::debug,
};

use crate::{
    Error, Result,
    error::Context,
    model::{ChatMessage, ConversationSummary, NewMessage},
    store::MessageStore,
};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, text, is_user, is_read, provider_message_id, created_at FROM chat_messages";

/// SQLite persistence for the chat message log.
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Use a shared pool. [`crate::run_migrations`] must have been called.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, message: NewMessage) -> Result<ChatMessage> {
        if message.user_id.trim().is_empty() {
            return Err(Error::EmptyUserId);
        }
        if message.text.trim().is_empty() {
            return Err(Error::EmptyText);
        }

        let created_at = now_ms();
        let result = sqlx::query(
            "INSERT INTO chat_messages (user_id, text, is_user, is_read, provider_message_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.user_id)
        .bind(&message.text)
        .bind(message.is_user)
        .bind(message.is_read)
        .bind(message.provider_message_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, user_id = %message.user_id, is_user = message.is_user, "message appended");

        Ok(ChatMessage {
            id,
            user_id: message.user_id,
            text: message.text,
            is_user: message.is_user,
            is_read: message.is_read,
            provider_message_id: message.provider_message_id,
            created_at,
        })
    }

    async fn list_since(
        &self,
        user_id: &str,
        last_id: i64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessage>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND id > ? ORDER BY created_at, id LIMIT ?"
        ))
        .bind(user_id)
        .bind(last_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn history(&self, user_id: &str, page: PageRequest) -> Result<Page<ChatMessage>> {
        let page = page.normalized();
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, ChatMessage>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY created_at, id LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, page))
    }

    async fn mark_read(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE chat_messages SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_user_messages_read(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET is_read = 1 WHERE user_id = ? AND is_user = 1 AND is_read = 0",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_conversation(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete conversation {user_id}"))?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_messages WHERE is_user = 1 AND is_read = 0",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationSummary>(
            r#"WITH ranked AS (
                 SELECT user_id, text, is_user, created_at, id,
                        ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY created_at DESC, id DESC) AS rn,
                        COUNT(*) OVER (PARTITION BY user_id) AS total_messages,
                        SUM(CASE WHEN is_user = 1 AND is_read = 0 THEN 1 ELSE 0 END)
                            OVER (PARTITION BY user_id) AS unread_count
                 FROM chat_messages
               )
               SELECT user_id,
                      text       AS last_message,
                      created_at AS last_message_time,
                      is_user    AS last_message_is_user,
                      total_messages,
                      unread_count
               FROM ranked
               WHERE rn = 1
               ORDER BY created_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, sqlx::sqlite::SqlitePoolOptions};

    async fn test_store() -> SqliteMessageStore {
        // One connection: every new `sqlite::memory:` connection is a fresh database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteMessageStore::with_pool(pool)
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let store = test_store().await;
        let a = store.append(NewMessage::visitor("u1", "Salom")).await.unwrap();
        let b = store.append(NewMessage::visitor("u1", "Hello")).await.unwrap();
        assert!(b.id > a.id);
        assert!(!a.is_read);
        assert!(a.created_at > 0);
    }

    #[tokio::test]
    async fn append_rejects_blank_text() {
        let store = test_store().await;
        let err = store
            .append(NewMessage::visitor("u1", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyText));
        assert!(err.is_validation());
        assert_eq!(store.list_since("u1", 0, 50).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_since_filters_by_cursor_and_user() {
        let store = test_store().await;
        let first = store.append(NewMessage::visitor("u1", "one")).await.unwrap();
        store.append(NewMessage::visitor("u2", "other")).await.unwrap();
        store
            .append(NewMessage::operator("u1", "two").with_provider_id(555))
            .await
            .unwrap();

        let all = store.list_since("u1", 0, 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "one");

        let newer = store.list_since("u1", first.id, 50).await.unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].text, "two");
        assert_eq!(newer[0].provider_message_id, Some(555));
        assert!(!newer[0].is_user);
    }

    #[tokio::test]
    async fn list_since_respects_limit() {
        let store = test_store().await;
        for i in 0..60 {
            store
                .append(NewMessage::visitor("u1", format!("m{i}")))
                .await
                .unwrap();
        }
        let page = store.list_since("u1", 0, 50).await.unwrap();
        assert_eq!(page.len(), 50);
        assert_eq!(page[0].text, "m0");
    }

    #[tokio::test]
    async fn mark_read_flags_single_message() {
        let store = test_store().await;
        let msg = store.append(NewMessage::visitor("u1", "hi")).await.unwrap();
        assert!(store.mark_read(msg.id).await.unwrap());
        assert!(!store.mark_read(9_999).await.unwrap());
        assert_eq!(store.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_conversation_leaves_other_users() {
        let store = test_store().await;
        store.append(NewMessage::visitor("u1", "a")).await.unwrap();
        store.append(NewMessage::operator("u1", "b")).await.unwrap();
        store.append(NewMessage::visitor("u2", "c")).await.unwrap();

        assert_eq!(store.delete_conversation("u1").await.unwrap(), 2);
        assert!(store.list_since("u1", 0, 50).await.unwrap().is_empty());
        assert_eq!(store.list_since("u2", 0, 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_failure_names_the_conversation() {
        let store = test_store().await;
        store.pool.close().await;

        let err = store.delete_conversation("u1").await.unwrap_err();
        assert!(!err.is_validation());
        assert!(
            err.to_string()
                .starts_with("failed to delete conversation u1: ")
        );
    }

    #[tokio::test]
    async fn history_pages_and_marks_read_separately() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .append(NewMessage::visitor("u1", format!("m{i}")))
                .await
                .unwrap();
        }
        let page = store.history("u1", PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].text, "m2");

        assert_eq!(store.unread_count().await.unwrap(), 5);
        assert_eq!(store.mark_user_messages_read("u1").await.unwrap(), 5);
        assert_eq!(store.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn conversations_summarize_each_user() {
        let store = test_store().await;
        store.append(NewMessage::visitor("u1", "first")).await.unwrap();
        store
            .append(NewMessage::operator("u1", "answer").read())
            .await
            .unwrap();
        store.append(NewMessage::visitor("u2", "hello")).await.unwrap();

        let convs = store.conversations().await.unwrap();
        assert_eq!(convs.len(), 2);

        let u1 = convs.iter().find(|c| c.user_id == "u1").unwrap();
        assert_eq!(u1.last_message, "answer");
        assert!(!u1.last_message_is_user);
        assert_eq!(u1.total_messages, 2);
        assert_eq!(u1.unread_count, 1);

        let u2 = convs.iter().find(|c| c.user_id == "u2").unwrap();
        assert_eq!(u2.unread_count, 1);
        assert!(u2.last_message_is_user);
    }
}
