use serde::{Deserialize, Serialize};

/// Operator card shown in the chat widget header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorInfo {
    pub name: String,
    pub role: String,
    /// Public Telegram handle, e.g. `@buran_manager_sofia`.
    pub telegram: String,
}

impl Default for OperatorInfo {
    fn default() -> Self {
        Self {
            name: "Operator Safia".into(),
            role: "User".into(),
            telegram: "@buran_manager_sofia".into(),
        }
    }
}
