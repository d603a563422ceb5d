//! Wire shapes of the chat and admin endpoints.
//!
//! Field names follow what the website widget and the admin panel already
//! send and expect (`userId`, `odId`, ISO timestamps).

use {
    buran_auto_reply::{OperatorInfo, QuickReplies},
    buran_messages::{ChatMessage, ConversationSummary},
    chrono::{DateTime, SecondsFormat},
    serde::{Deserialize, Deserializer, Serialize},
};

/// ISO-8601 UTC with milliseconds, e.g. `2026-01-05T09:30:00.000Z`.
pub fn iso_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parameters of the public chat endpoint, from the query string (GET) or
/// the JSON body (POST).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatActionParams {
    pub action: Option<String>,
    pub user_id: Option<String>,
    pub message: Option<String>,
    #[serde(deserialize_with = "id_param")]
    pub last_id: Option<String>,
    #[serde(deserialize_with = "id_param")]
    pub message_id: Option<String>,
}

/// Accept ids as JSON numbers or strings.
fn id_param<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    }))
}

/// A message as the website widget renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMessage {
    pub id: i64,
    pub text: String,
    pub is_user: bool,
    pub is_read: bool,
    pub timestamp: String,
}

impl From<ChatMessage> for WidgetMessage {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            timestamp: iso_timestamp(m.created_at),
            text: m.text,
            is_user: m.is_user,
            is_read: m.is_read,
        }
    }
}

/// A message as the admin panel renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminMessage {
    pub id: i64,
    pub text: String,
    pub is_user: bool,
    pub is_read: bool,
    pub created_at: String,
}

impl From<ChatMessage> for AdminMessage {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            created_at: iso_timestamp(m.created_at),
            text: m.text,
            is_user: m.is_user,
            is_read: m.is_read,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    /// Visitor id. The admin panel calls it `odId`.
    #[serde(rename = "odId")]
    pub user_id: String,
    pub last_message: String,
    pub last_message_time: String,
    pub last_message_is_user: bool,
    pub total_messages: i64,
    pub unread_count: i64,
}

impl From<ConversationSummary> for ConversationView {
    fn from(c: ConversationSummary) -> Self {
        Self {
            user_id: c.user_id,
            last_message: c.last_message,
            last_message_time: iso_timestamp(c.last_message_time),
            last_message_is_user: c.last_message_is_user,
            total_messages: c.total_messages,
            unread_count: c.unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub messages: Vec<AdminMessage>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminReplyBody {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickRepliesBody {
    pub quick_replies: QuickReplies,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfoBody {
    pub operator_info: OperatorInfo,
}
