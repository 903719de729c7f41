use std::fmt;
use std::str::FromStr;

use crate::folders::node::ItemKind;
use crate::folders::path::{FolderPath, NodePath};
use crate::folders::FolderError;

/// Identifies an item in the open directory: its kind and list index,
/// written `folder:2` or `chat:0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub kind: ItemKind,
    pub index: usize,
}

impl SelectionKey {
    pub fn folder(index: usize) -> Self {
        Self {
            kind: ItemKind::Folder,
            index,
        }
    }

    pub fn chat(index: usize) -> Self {
        Self {
            kind: ItemKind::Chat,
            index,
        }
    }

    /// Full path of this item when the directory at `dir` is open.
    pub fn path_in(&self, dir: &FolderPath) -> NodePath {
        match self.kind {
            ItemKind::Folder => NodePath::Folder(dir.child(self.index)),
            ItemKind::Chat => NodePath::Chat {
                folder: dir.clone(),
                index: self.index,
            },
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.index)
    }
}

impl FromStr for SelectionKey {
    type Err = FolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || FolderError::BadPath(s.to_string());
        let (kind, index) = s.split_once(':').ok_or_else(bad)?;
        let index = index.parse().map_err(|_| bad())?;
        match kind {
            "folder" => Ok(Self::folder(index)),
            "chat" => Ok(Self::chat(index)),
            _ => Err(bad()),
        }
    }
}

/// Items marked in the open directory, in the order they were marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: Vec<SelectionKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain toggle replaces the selection with `key`; multi toggle flips
    /// membership of `key` and leaves the rest alone.
    pub fn toggle(&mut self, key: SelectionKey, multi: bool) {
        if !multi {
            self.keys.clear();
            self.keys.push(key);
            return;
        }
        match self.keys.iter().position(|k| *k == key) {
            Some(pos) => {
                self.keys.remove(pos);
            }
            None => self.keys.push(key),
        }
    }

    /// Select every item of a listing.
    pub fn select_all(&mut self, keys: impl IntoIterator<Item = SelectionKey>) {
        self.keys = keys.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[SelectionKey] {
        &self.keys
    }

    pub fn first(&self) -> Option<SelectionKey> {
        self.keys.first().copied()
    }

    /// Paths of every selected item under `dir`.
    pub fn paths_in(&self, dir: &FolderPath) -> Vec<NodePath> {
        self.keys.iter().map(|k| k.path_in(dir)).collect()
    }
}
