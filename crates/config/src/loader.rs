use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::BuranConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["buran.toml", "buran.yaml", "buran.yml", "buran.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BuranConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. `./buran.{toml,yaml,yml,json}`
/// 2. `<user config dir>/buran.{toml,yaml,yml,json}`
///
/// Falls back to `BuranConfig::default()` when nothing is found or the file
/// fails to parse.
pub fn discover_and_load() -> BuranConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                BuranConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            BuranConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/buran/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "buran").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the SQLite database.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "buran")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Overlay well-known environment variables onto a parsed config.
pub fn apply_env_overrides(config: &mut BuranConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut BuranConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(bind) = get("BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = get("PORT") {
        match port.parse() {
            Ok(p) => config.server.port = p,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT"),
        }
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = chat_id;
    }
    if let Some(url) = get("GOOGLE_SHEETS_URL") {
        config.sheets.url = Some(url);
    }
    if let Some(token) = get("ADMIN_TOKEN") {
        config.auth.admin_token = Some(Secret::new(token));
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BuranConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
