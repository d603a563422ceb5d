//! Configuration loading, env substitution, env overrides, and validation.
//!
//! Config files: `buran.toml`, `buran.yaml`, `buran.yml`, or `buran.json`,
//! searched in `./` then the user config directory. `${ENV_VAR}` placeholders
//! are substituted in the raw file before parsing, and a fixed set of
//! environment variables (`PORT`, `TELEGRAM_BOT_TOKEN`, ...) override parsed
//! values afterwards.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, find_config_file,
        load_config,
    },
    schema::{
        AuthConfig, BuranConfig, DatabaseConfig, MetricsConfig, OutboundConfig, ServerConfig,
        SheetsConfig, TelegramConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
