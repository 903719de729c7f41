use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tracing::warn;

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Extension of files holding a stored key.
pub const STORE_EXTENSION: &str = "json";

/// Watches a store directory and reports which keys were rewritten.
pub struct StoreWatcher {
    /// Handle to the debouncer (dropped to stop watching).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl StoreWatcher {
    /// Watch `dir` (non-recursively). Each debounced batch is reduced to the
    /// set of keys whose files changed and handed to `on_keys`.
    pub fn new<F>(dir: &Path, debounce_duration: Duration, on_keys: F) -> notify::Result<Self>
    where
        F: Fn(Vec<(String, PathBuf)>) + Send + 'static,
    {
        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                match result {
                    Ok(events) => {
                        let changed = changed_keys(
                            events
                                .iter()
                                .filter(|e| e.kind == DebouncedEventKind::Any)
                                .map(|e| e.path.as_path()),
                        );
                        if !changed.is_empty() {
                            on_keys(changed);
                        }
                    }
                    Err(e) => warn!("store watcher error: {}", e),
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)?;

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Key stored in `path`, if it is a store file.
///
/// Hidden files (the store's temporary files) and other extensions are not
/// store files.
pub fn key_for_path(path: &Path) -> Option<String> {
    if path.extension()? != STORE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

/// Distinct keys touched by a batch of paths, in first-seen order.
fn changed_keys<'a>(paths: impl Iterator<Item = &'a Path>) -> Vec<(String, PathBuf)> {
    let mut seen = BTreeSet::new();
    paths
        .filter_map(|p| key_for_path(p).map(|k| (k, p.to_path_buf())))
        .filter(|(k, _)| seen.insert(k.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_files_map_to_keys() {
        assert_eq!(
            key_for_path(Path::new("/s/gemini_folders_data.json")).as_deref(),
            Some("gemini_folders_data")
        );
    }

    #[test]
    fn temp_and_foreign_files_are_ignored() {
        assert!(key_for_path(Path::new("/s/.gemini_folders_data.json.tmp")).is_none());
        assert!(key_for_path(Path::new("/s/.hidden.json")).is_none());
        assert!(key_for_path(Path::new("/s/chatfm.log")).is_none());
        assert!(key_for_path(Path::new("/s/noext")).is_none());
    }

    #[test]
    fn batch_is_reduced_to_distinct_keys() {
        let paths = [
            PathBuf::from("/s/b.json"),
            PathBuf::from("/s/.b.json.tmp"),
            PathBuf::from("/s/a.json"),
            PathBuf::from("/s/b.json"),
        ];
        let keys: Vec<String> = changed_keys(paths.iter().map(|p| p.as_path()))
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
