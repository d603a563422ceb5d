//! Settings-backed access to the canned-reply table and operator card.

use {buran_settings::SettingsStore, tracing::debug};

use crate::{OperatorInfo, QuickReplies, Result};

/// Settings key holding the quick-reply table.
pub const QUICK_REPLIES_KEY: &str = "quickReplies";
/// Settings key holding the operator card.
pub const OPERATOR_INFO_KEY: &str = "operatorInfo";

/// Reads and writes the chat widget's canned content.
#[derive(Clone)]
pub struct AutoReplies {
    settings: SettingsStore,
}

impl AutoReplies {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    /// Current table, or the built-in defaults when none was saved.
    pub async fn quick_replies(&self) -> Result<QuickReplies> {
        Ok(self
            .settings
            .get_or(QUICK_REPLIES_KEY, QuickReplies::default())
            .await?)
    }

    pub async fn set_quick_replies(&self, table: &QuickReplies) -> Result<()> {
        table.validate()?;
        self.settings.set(QUICK_REPLIES_KEY, table).await?;
        Ok(())
    }

    pub async fn operator_info(&self) -> Result<OperatorInfo> {
        Ok(self
            .settings
            .get_or(OPERATOR_INFO_KEY, OperatorInfo::default())
            .await?)
    }

    pub async fn set_operator_info(&self, info: &OperatorInfo) -> Result<()> {
        self.settings.set(OPERATOR_INFO_KEY, info).await?;
        Ok(())
    }

    /// Canned answer for a visitor message, if its text is a trigger.
    pub async fn reply_for(&self, text: &str) -> Result<Option<String>> {
        let table = self.quick_replies().await?;
        let answer = table.lookup(text).map(str::to_owned);
        if answer.is_some() {
            debug!(trigger = text, "quick reply matched");
        }
        Ok(answer)
    }
}
