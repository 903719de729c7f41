use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::storage::watcher::{StoreWatcher, STORE_EXTENSION};
use crate::storage::{ChangeCallback, PersistenceGateway, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Own writes the watcher may still report, per key.
const PENDING_WRITES: usize = 8;

/// What this store knows about one key's file.
#[derive(Default)]
struct KeyState {
    /// Content last read from or observed in the file.
    seen: Option<String>,
    /// Own writes not yet observed by the watcher, oldest first.
    pending: VecDeque<String>,
}

/// State shared with the watcher thread.
#[derive(Default)]
struct Shared {
    keys: Mutex<HashMap<String, KeyState>>,
    listeners: Mutex<HashMap<String, Vec<ChangeCallback>>>,
}

impl Shared {
    fn remember_read(&self, key: &str, content: &str) {
        lock(&self.keys).entry(key.to_string()).or_default().seen = Some(content.to_string());
    }

    fn remember_write(&self, key: &str, content: &str) {
        let mut keys = lock(&self.keys);
        let pending = &mut keys.entry(key.to_string()).or_default().pending;
        pending.push_back(content.to_string());
        if pending.len() > PENDING_WRITES {
            pending.pop_front();
        }
    }

    /// Record `content` as observed and tell whether it was already known.
    /// Observing an own write retires it together with every older one.
    fn observe(&self, key: &str, content: &str) -> bool {
        let mut keys = lock(&self.keys);
        let state = keys.entry(key.to_string()).or_default();
        let known = match state.pending.iter().position(|c| c == content) {
            Some(pos) => {
                state.pending.drain(..=pos);
                true
            }
            None => state.seen.as_deref() == Some(content),
        };
        state.seen = Some(content.to_string());
        known
    }

    /// Report changed keys to their listeners, skipping content this store
    /// already knows about.
    fn dispatch(&self, changed: Vec<(String, PathBuf)>) {
        for (key, path) in changed {
            let listeners = lock(&self.listeners);
            let Some(callbacks) = listeners.get(&key) else {
                continue;
            };
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    debug!("{} vanished before it could be read: {}", path.display(), e);
                    continue;
                }
            };
            if self.observe(&key, &content) {
                continue;
            }
            match serde_json::from_str::<Value>(&content) {
                Ok(value) => {
                    info!("external change to {}", key);
                    for callback in callbacks {
                        callback(value.clone());
                    }
                }
                Err(e) => warn!("ignoring unreadable external write to {}: {}", key, e),
            }
        }
    }
}

/// Stores each key as `<key>.json` in one directory.
pub struct JsonFileStore {
    dir: PathBuf,
    shared: Arc<Shared>,
    debounce: Option<Duration>,
    watcher: Mutex<Option<StoreWatcher>>,
}

impl JsonFileStore {
    /// A store without change notification.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            shared: Arc::new(Shared::default()),
            debounce: None,
            watcher: Mutex::new(None),
        }
    }

    /// Enable external-change notification, debounced by `debounce`.
    pub fn with_watcher(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, STORE_EXTENSION))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", key, STORE_EXTENSION))
    }

    fn ensure_watcher(&self) -> Result<()> {
        let Some(debounce) = self.debounce else {
            return Ok(());
        };
        let mut slot = lock(&self.watcher);
        if slot.is_none() {
            std::fs::create_dir_all(&self.dir)?;
            let shared = self.shared.clone();
            let watcher = StoreWatcher::new(&self.dir, debounce, move |changed| {
                shared.dispatch(changed)
            })?;
            info!("watching {}", self.dir.display());
            *slot = Some(watcher);
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&content)?;
        self.shared.remember_read(key, &content);
        debug!("loaded {} from {}", key, path.display());
        Ok(Some(value))
    }

    /// Write to a hidden temp file, then rename it over the key's file so
    /// readers never see a partial document.
    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        // Remembered before the write lands so the watcher never sees it as foreign.
        self.shared.remember_write(key, &content);
        let tmp = self.temp_path_for(key);
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, self.path_for(key)).await?;
        debug!("saved {} ({} bytes)", key, content.len());
        Ok(())
    }

    fn on_external_change(&self, key: &str, callback: ChangeCallback) -> Result<()> {
        lock(&self.shared.listeners)
            .entry(key.to_string())
            .or_default()
            .push(callback);
        self.ensure_watcher()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, SETTINGS_KEY, TREE_KEY};
    use serde_json::json;
    use std::sync::mpsc;

    fn collector(store: &JsonFileStore, key: &str) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        store
            .on_external_change(
                key,
                Box::new(move |v| {
                    let _ = lock(&tx).send(v);
                }),
            )
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn missing_key_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(TREE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let value = json!({"folders": [{"name": "A", "icon": "📁", "chats": [], "folders": []}]});
        store.save(TREE_KEY, &value).await.unwrap();
        assert_eq!(store.load(TREE_KEY).await.unwrap(), Some(value));
        assert!(store.path_for(TREE_KEY).exists());
        assert!(!store.temp_path_for(TREE_KEY).exists());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(TREE_KEY, &json!({"folders": []})).await.unwrap();
        store.save(SETTINGS_KEY, &json!({"wideMode": true})).await.unwrap();
        assert_eq!(
            store.load(SETTINGS_KEY).await.unwrap(),
            Some(json!({"wideMode": true}))
        );
        assert_eq!(store.load(TREE_KEY).await.unwrap(), Some(json!({"folders": []})));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path_for(TREE_KEY), "{ not json").unwrap();
        assert!(matches!(
            store.load(TREE_KEY).await,
            Err(StorageError::Json(_))
        ));
    }

    #[tokio::test]
    async fn own_writes_are_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let rx = collector(&store, TREE_KEY);
        store.save(TREE_KEY, &json!({"folders": []})).await.unwrap();
        store
            .shared
            .dispatch(vec![(TREE_KEY.to_string(), store.path_for(TREE_KEY))]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn foreign_writes_are_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let rx = collector(&store, TREE_KEY);
        let settings_rx = collector(&store, SETTINGS_KEY);
        store.save(TREE_KEY, &json!({"folders": []})).await.unwrap();

        std::fs::write(store.path_for(TREE_KEY), r#"{"folders":[{"name":"B"}]}"#).unwrap();
        let changed = vec![(TREE_KEY.to_string(), store.path_for(TREE_KEY))];
        store.shared.dispatch(changed.clone());
        assert_eq!(rx.try_recv().unwrap(), json!({"folders": [{"name": "B"}]}));

        // Same content again is not a new change.
        store.shared.dispatch(changed);
        assert!(rx.try_recv().is_err());
        assert!(settings_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn quick_successive_own_writes_are_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let rx = collector(&store, TREE_KEY);
        let first = json!({"folders": [{"name": "A"}]});
        store.save(TREE_KEY, &first).await.unwrap();
        store.save(TREE_KEY, &json!({"folders": []})).await.unwrap();
        let path = store.path_for(TREE_KEY);
        let changed = vec![(TREE_KEY.to_string(), path.clone())];

        // The watcher read the file while the first write was still on disk.
        let first_text = serde_json::to_string_pretty(&first).unwrap();
        std::fs::write(&path, &first_text).unwrap();
        store.shared.dispatch(changed.clone());
        std::fs::write(&path, serde_json::to_string_pretty(&json!({"folders": []})).unwrap())
            .unwrap();
        store.shared.dispatch(changed.clone());
        assert!(rx.try_recv().is_err());

        // Once observed, the old content counts as foreign again.
        std::fs::write(&path, &first_text).unwrap();
        store.shared.dispatch(changed);
        assert_eq!(rx.try_recv().unwrap(), first);
    }

    #[tokio::test]
    async fn unreadable_foreign_write_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let rx = collector(&store, TREE_KEY);
        std::fs::write(store.path_for(TREE_KEY), "garbage").unwrap();
        store
            .shared
            .dispatch(vec![(TREE_KEY.to_string(), store.path_for(TREE_KEY))]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn watcher_delivers_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).with_watcher(Duration::from_millis(50));
        let rx = collector(&store, TREE_KEY);
        std::fs::write(store.path_for(TREE_KEY), r#"{"folders":[]}"#).unwrap();
        let value = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, json!({"folders": []}));
    }
}
