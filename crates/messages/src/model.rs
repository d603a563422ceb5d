use serde::{Deserialize, Serialize};

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned, strictly increasing. The website uses it as its cursor.
    pub id: i64,
    pub user_id: String,
    pub text: String,
    pub is_user: bool,
    pub is_read: bool,
    /// Bot API message id, for messages that went through Telegram.
    pub provider_message_id: Option<i64>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A message about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub user_id: String,
    pub text: String,
    pub is_user: bool,
    pub is_read: bool,
    pub provider_message_id: Option<i64>,
}

impl NewMessage {
    /// Message typed by the website visitor.
    pub fn visitor(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            is_user: true,
            is_read: false,
            provider_message_id: None,
        }
    }

    /// Message addressed to the visitor (operator answer or canned reply).
    pub fn operator(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            ..Self::visitor(user_id, text)
        }
    }

    #[must_use]
    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }

    #[must_use]
    pub fn with_provider_id(mut self, id: i64) -> Self {
        self.provider_message_id = Some(id);
        self
    }
}

/// One row of the admin conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub user_id: String,
    pub last_message: String,
    pub last_message_time: i64,
    pub last_message_is_user: bool,
    pub total_messages: i64,
    /// Visitor messages the operator has not opened yet.
    pub unread_count: i64,
}
