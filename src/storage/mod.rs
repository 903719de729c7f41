//! Key-value persistence of the folder tree and settings.

pub mod json_store;
#[cfg(test)]
pub mod memory;
pub mod settings;
pub mod watcher;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Key holding the folder tree.
pub const TREE_KEY: &str = "gemini_folders_data";
/// Key holding user settings.
pub const SETTINGS_KEY: &str = "gemini_architect_settings";
/// Key holding the remote sync session.
pub const SESSION_KEY: &str = "supabase_session";

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot watch store: {0}")]
    Watch(String),
}

impl From<notify::Error> for StorageError {
    fn from(e: notify::Error) -> Self {
        StorageError::Watch(e.to_string())
    }
}

/// Called with the new value whenever another process rewrites a key.
pub type ChangeCallback = Box<dyn Fn(Value) + Send + Sync>;

/// Key-value store the tree and settings are persisted to.
///
/// Values are whole JSON documents; a save replaces the previous value.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read a key. `Ok(None)` when nothing was stored yet.
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Replace a key's value.
    async fn save(&self, key: &str, value: &Value) -> Result<()>;

    /// Register `callback` for changes to `key` made outside this store
    /// instance. Writes made through this instance are not reported.
    fn on_external_change(&self, key: &str, callback: ChangeCallback) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(StorageError::from(io).to_string().contains("read-only"));
        assert_eq!(
            StorageError::Watch("no inotify".into()).to_string(),
            "Cannot watch store: no inotify"
        );
    }

    #[test]
    fn json_error_converts() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        assert!(matches!(StorageError::from(err), StorageError::Json(_)));
    }
}
