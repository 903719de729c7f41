//! In-memory store for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::storage::{ChangeCallback, PersistenceGateway, Result, StorageError};

#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
    listeners: Arc<Mutex<HashMap<String, Vec<ChangeCallback>>>>,
    save_should_fail: Arc<Mutex<bool>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn set_save_should_fail(&self, should_fail: bool) {
        *self.save_should_fail.lock().unwrap() = should_fail;
    }

    /// Write `value` as if another process had, notifying listeners.
    pub fn write_externally(&self, key: &str, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        if let Some(callbacks) = self.listeners.lock().unwrap().get(key) {
            for callback in callbacks {
                callback(value.clone());
            }
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        if *self.save_should_fail.lock().unwrap() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock save failure",
            )));
        }
        *self.saves.lock().unwrap() += 1;
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn on_external_change(&self, key: &str, callback: ChangeCallback) -> Result<()> {
        self.listeners
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(callback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_load_and_notify() {
        let store = MemoryStore::new();
        assert!(store.load("k").await.unwrap().is_none());
        store.save("k", &json!(1)).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(json!(1)));
        assert_eq!(store.save_count(), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store
            .on_external_change("k", Box::new(move |v| sink.lock().unwrap().push(v)))
            .unwrap();
        store.write_externally("k", json!(2));
        assert_eq!(*seen.lock().unwrap(), vec![json!(2)]);
    }

    #[tokio::test]
    async fn failing_save() {
        let store = MemoryStore::new();
        store.set_save_should_fail(true);
        assert!(store.save("k", &json!(1)).await.is_err());
        assert!(store.get("k").is_none());
    }
}
