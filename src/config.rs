//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--store-dir`, `--no-watcher`, `--no-sync`)
//! 2. `$CHATFM_CONFIG` environment variable (path to config file)
//! 3. Project-local `.chatfm.toml` in the current working directory
//! 4. Global `~/.config/chatfm/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::host::DEFAULT_HOST_TIMEOUT_SECS;
use crate::storage::watcher::DEFAULT_DEBOUNCE_MS;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the stored keys.
    pub store_dir: Option<String>,
    /// Base URL of the chat application; relative chat URLs resolve against it.
    pub base_url: Option<String>,
    /// Confirm before delete operations.
    pub confirm_delete: Option<bool>,
}

/// Store watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Reload when another process rewrites the store.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Remote sync settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: Option<bool>,
    /// Backend base URL, e.g. `https://<project>.supabase.co`.
    pub url: Option<String>,
    /// Public API key sent with every request.
    pub api_key: Option<String>,
}

/// Host application bridge settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Seconds to wait for a host rename/delete flow.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `chat_folders=debug`.
    pub level: Option<String>,
    /// Log file; defaults to `chatfm.log` in the store directory.
    pub file: Option<String>,
}

/// Color overrides for a theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub list_fg: Option<String>,
    pub list_selected_bg: Option<String>,
    pub folder_fg: Option<String>,
    pub chat_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub watcher: WatcherConfig,
    pub sync: SyncConfig,
    pub host: HostConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "https://gemini.google.com";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_FILE_NAME: &str = "chatfm.log";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("CHATFM_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".chatfm.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("chatfm").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr,
/// since logging is configured from the result).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                store_dir: other.general.store_dir.clone().or(self.general.store_dir),
                base_url: other.general.base_url.clone().or(self.general.base_url),
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            sync: SyncConfig {
                enabled: other.sync.enabled.or(self.sync.enabled),
                url: other.sync.url.clone().or(self.sync.url),
                api_key: other.sync.api_key.clone().or(self.sync.api_key),
            },
            host: HostConfig {
                timeout_secs: other.host.timeout_secs.or(self.host.timeout_secs),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                file: other.logging.file.clone().or(self.logging.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher-priority files overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Store directory: configured, else `<data dir>/chatfm`, else `./.chatfm`.
    pub fn store_dir(&self) -> PathBuf {
        match &self.general.store_dir {
            Some(dir) => expand_home(dir),
            None => dirs::data_dir()
                .map(|d| d.join("chatfm"))
                .unwrap_or_else(|| PathBuf::from(".chatfm")),
        }
    }

    pub fn base_url(&self) -> &str {
        self.general.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Backend URL and API key, when sync is enabled and both are set.
    pub fn sync_endpoint(&self) -> Option<(&str, &str)> {
        if !self.sync.enabled.unwrap_or(true) {
            return None;
        }
        match (self.sync.url.as_deref(), self.sync.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() => Some((url, key)),
            _ => None,
        }
    }

    pub fn host_timeout(&self) -> Duration {
        Duration::from_secs(self.host.timeout_secs.unwrap_or(DEFAULT_HOST_TIMEOUT_SECS))
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> PathBuf {
        match &self.logging.file {
            Some(file) => expand_home(file),
            None => self.store_dir().join(LOG_FILE_NAME),
        }
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
