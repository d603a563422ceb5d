//! Semantic configuration checks.
//!
//! Parsing already rejects malformed files; this module reports settings that
//! parse fine but would leave the relay half-working.

use secrecy::ExposeSecret;

use crate::schema::BuranConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.chat_id"
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check a loaded configuration.
pub fn validate(config: &BuranConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let tg = &config.telegram;

    if !tg.is_configured() {
        result.push(
            Severity::Info,
            "telegram.token",
            "no bot token: visitor messages are stored but not relayed",
        );
    } else {
        if tg.chat_id.trim().is_empty() {
            result.push(
                Severity::Error,
                "telegram.chat_id",
                "bot token is set but no operator chat is configured",
            );
        }
        if !tg.token.expose_secret().contains(':') {
            result.push(
                Severity::Warning,
                "telegram.token",
                "token does not look like a Bot API token (<id>:<secret>)",
            );
        }
    }

    if tg.poll_interval_secs == 0 {
        result.push(
            Severity::Error,
            "telegram.poll_interval_secs",
            "poll interval must be at least one second",
        );
    }
    if !(1..=100).contains(&tg.poll_limit) {
        result.push(
            Severity::Error,
            "telegram.poll_limit",
            "getUpdates accepts a limit between 1 and 100",
        );
    }
    if tg.correlation_capacity == 0 {
        result.push(
            Severity::Warning,
            "telegram.correlation_capacity",
            "capacity 0 means operator replies can never be attributed",
        );
    }

    if config.outbound.queue_capacity == 0 {
        result.push(
            Severity::Error,
            "outbound.queue_capacity",
            "queue capacity must be positive",
        );
    }

    if let Some(url) = &config.sheets.url
        && !(url.starts_with("https://") || url.starts_with("http://"))
    {
        result.push(
            Severity::Error,
            "sheets.url",
            format!("not an http(s) URL: {url}"),
        );
    }

    if config.auth.admin_token.is_none() && config.server.bind != "127.0.0.1" {
        result.push(
            Severity::Warning,
            "auth.admin_token",
            "admin endpoints are unauthenticated on a non-loopback address",
        );
    }

    result
}
