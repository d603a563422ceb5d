use std::collections::BTreeMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuranConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub sheets: SheetsConfig,
    pub auth: AuthConfig,
    pub outbound: OutboundConfig,
    pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. When unset, `buran.db` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL, falling back to a file under `data_dir`.
    pub fn resolved_url(&self, data_dir: &std::path::Path) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}?mode=rwc", data_dir.join("buran.db").display()),
        }
    }
}

/// Telegram bot used for the operator relay.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Empty disables the relay and the poller.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Operator chat (numeric id or `@channel`) that receives visitor messages.
    pub chat_id: String,

    /// Seconds between scheduled poll cycles.
    pub poll_interval_secs: u64,

    /// `limit` passed to getUpdates (1-100).
    pub poll_limit: u8,

    /// Bot API base URL override (tests and self-hosted bot API servers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// How long a relayed message stays answerable by reply, in seconds.
    pub correlation_ttl_secs: u64,

    /// Maximum number of remembered relayed messages.
    pub correlation_capacity: usize,
}

impl TelegramConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish_non_exhaustive()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            chat_id: String::new(),
            poll_interval_secs: 2,
            poll_limit: 100,
            api_url: None,
            correlation_ttl_secs: 24 * 60 * 60,
            correlation_capacity: 10_000,
        }
    }
}

/// Spreadsheet webhook that receives one row per lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Admin endpoint protection.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Static bearer token for `/api/chat/admin/*`. Unset leaves them open.
    #[serde(
        serialize_with = "serialize_optional_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_token: Option<Secret<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Outbound dispatcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Pending tasks held before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Labels added to every exported metric (e.g. `instance`).
    pub labels: BTreeMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            labels: BTreeMap::new(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_optional_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_deployment() {
        let cfg = BuranConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.telegram.poll_interval_secs, 2);
        assert_eq!(cfg.telegram.poll_limit, 100);
        assert_eq!(cfg.telegram.correlation_ttl_secs, 86_400);
        assert!(!cfg.telegram.is_configured());
        assert!(cfg.sheets.url.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let cfg: BuranConfig = toml::from_str(
            r#"
            [telegram]
            token = "123:ABC"
            chat_id = "-1001"

            [auth]
            admin_token = "s3cret"
            "#,
        )
        .unwrap();
        assert!(cfg.telegram.is_configured());
        assert_eq!(cfg.telegram.chat_id, "-1001");
        assert_eq!(cfg.telegram.poll_limit, 100);
        assert_eq!(
            cfg.auth.admin_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("s3cret")
        );
    }

    #[test]
    fn metrics_labels_from_toml() {
        let cfg: BuranConfig = toml::from_str(
            r#"
            [metrics.labels]
            instance = "tashkent-1"
            env = "prod"
            "#,
        )
        .unwrap();
        assert!(cfg.metrics.enabled);
        assert_eq!(cfg.metrics.labels.len(), 2);
        assert_eq!(cfg.metrics.labels["instance"], "tashkent-1");
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = TelegramConfig {
            token: Secret::new("123:ABC".into()),
            ..Default::default()
        };
        let out = format!("{cfg:?}");
        assert!(!out.contains("123:ABC"));
        assert!(out.contains("REDACTED"));
    }

    #[test]
    fn database_url_falls_back_to_data_dir() {
        let db = DatabaseConfig::default();
        let url = db.resolved_url(std::path::Path::new("/var/lib/buran"));
        assert_eq!(url, "sqlite:/var/lib/buran/buran.db?mode=rwc");
    }
}
