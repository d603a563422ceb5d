use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

/// Result of one outbound attempt.
///
/// Delivery problems are values, not errors: the action that triggered the
/// send has already succeeded by the time the outcome is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Delivered. `message_id` is the provider-assigned id (0 when the
    /// provider does not assign one).
    Sent { message_id: i64 },
    /// The target is not configured; nothing was attempted.
    NotConfigured,
    /// The provider or network rejected the send.
    Failed { reason: String },
}

impl SendOutcome {
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    #[must_use]
    pub fn message_id(&self) -> Option<i64> {
        match self {
            Self::Sent { message_id } => Some(*message_id),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::NotConfigured => "not_configured",
            Self::Failed { .. } => "failed",
        }
    }
}

/// A message for the operator channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMessage {
    /// HTML body.
    pub text: String,
    /// Target chat; the configured operator chat when `None`.
    pub chat_id: Option<String>,
    /// Provider message id to thread the message under.
    pub reply_to: Option<i64>,
    /// Visitor this message relays for. A successful send makes replies to
    /// it resolvable back to this visitor.
    pub conversation: Option<String>,
}

impl OperatorMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chat_id: None,
            reply_to: None,
            conversation: None,
        }
    }

    #[must_use]
    pub fn for_conversation(mut self, user_id: impl Into<String>) -> Self {
        self.conversation = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    #[must_use]
    pub fn to_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// One spreadsheet row as posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub name: String,
    pub phone: String,
    pub country: String,
    pub form_type: String,
    /// Local wall-clock time of submission, already formatted.
    pub timestamp: String,
}

/// Sends text to the human operator.
#[async_trait]
pub trait OperatorOutbound: Send + Sync {
    async fn send(&self, message: &OperatorMessage) -> SendOutcome;
}

/// Appends rows to the lead spreadsheet.
#[async_trait]
pub trait SpreadsheetSink: Send + Sync {
    async fn append_row(&self, row: &SheetRow) -> SendOutcome;
}

/// Stand-in for a target that has no configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl OperatorOutbound for Unconfigured {
    async fn send(&self, _message: &OperatorMessage) -> SendOutcome {
        SendOutcome::NotConfigured
    }
}

#[async_trait]
impl SpreadsheetSink for Unconfigured {
    async fn append_row(&self, _row: &SheetRow) -> SendOutcome {
        SendOutcome::NotConfigured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SendOutcome::Sent { message_id: 42 }).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["message_id"], 42);
        let json = serde_json::to_value(SendOutcome::failed("timeout")).unwrap();
        assert_eq!(json["reason"], "timeout");
    }

    #[test]
    fn sheet_row_uses_webhook_field_names() {
        let row = SheetRow {
            name: "Ali".into(),
            phone: "+998".into(),
            country: String::new(),
            form_type: "Website Form".into(),
            timestamp: "01.02.2026, 10:00:00".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["formType"], "Website Form");
    }
}
