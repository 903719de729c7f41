//! Positional addressing of folders and chats.
//!
//! A folder path is the sequence of `.folders` indices descending from the
//! root, written colon-joined (`"0:2:1"`). A chat path appends the `c` marker
//! and the chat's index in its folder (`"0:2:c:3"`). The empty path is the
//! root. Paths are positional: any sibling insert or removal at the same or
//! a shallower level invalidates them, so they are always resolved from the
//! root right before use.

use std::fmt;
use std::str::FromStr;

use crate::folders::node::{Chat, Folder, ItemKind, Tree};
use crate::folders::FolderError;

/// Segment separating a folder path from a chat index.
pub const CHAT_MARKER: &str = "c";

/// Address of a folder, or of the root when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderPath(Vec<usize>);

impl FolderPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Index of this folder within its parent's `.folders`.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// True when `self` equals `ancestor` or lies strictly beneath it.
    ///
    /// This is the cycle check for moves: a folder may never be placed at or
    /// below its own path.
    pub fn is_within(&self, ancestor: &FolderPath) -> bool {
        self.0.len() >= ancestor.0.len() && self.0[..ancestor.0.len()] == ancestor.0[..]
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl FromStr for FolderPath {
    type Err = FolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split(':')
            .map(|seg| {
                seg.parse::<usize>()
                    .map_err(|_| FolderError::BadPath(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Address of any node: a folder, or a chat inside a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodePath {
    Folder(FolderPath),
    Chat { folder: FolderPath, index: usize },
}

impl NodePath {
    pub fn kind(&self) -> ItemKind {
        match self {
            NodePath::Folder(_) => ItemKind::Folder,
            NodePath::Chat { .. } => ItemKind::Chat,
        }
    }

    /// The folder that lists this node: the parent for folders, the owner for chats.
    pub fn container(&self) -> FolderPath {
        match self {
            NodePath::Folder(path) => path.parent().unwrap_or_default(),
            NodePath::Chat { folder, .. } => folder.clone(),
        }
    }

    /// Position of the node within its container's list.
    pub fn index(&self) -> Option<usize> {
        match self {
            NodePath::Folder(path) => path.last(),
            NodePath::Chat { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePath::Folder(path) => write!(f, "{}", path),
            NodePath::Chat { folder, index } if folder.is_root() => {
                write!(f, "{}:{}", CHAT_MARKER, index)
            }
            NodePath::Chat { folder, index } => write!(f, "{}:{}:{}", folder, CHAT_MARKER, index),
        }
    }
}

impl FromStr for NodePath {
    type Err = FolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let segments: Vec<&str> = if s.is_empty() {
            Vec::new()
        } else {
            s.split(':').collect()
        };
        match segments.iter().position(|seg| *seg == CHAT_MARKER) {
            None => s.parse().map(NodePath::Folder),
            Some(marker) if marker + 2 == segments.len() => {
                let folder = segments[..marker].join(":").parse()?;
                let index = segments[marker + 1]
                    .parse()
                    .map_err(|_| FolderError::BadPath(s.to_string()))?;
                Ok(NodePath::Chat { folder, index })
            }
            Some(_) => Err(FolderError::BadPath(s.to_string())),
        }
    }
}

/// A folder found by walking a path.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub folder: &'a Folder,
    /// The list holding `folder` (the root list at depth one).
    pub siblings: &'a [Folder],
    pub index: usize,
}

/// A path walk that stopped early.
///
/// `valid_prefix` is the deepest prefix that still resolved, so callers can
/// act on the last known location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMiss {
    pub path: FolderPath,
    pub valid_prefix: FolderPath,
}

impl From<PathMiss> for FolderError {
    fn from(miss: PathMiss) -> Self {
        FolderError::NotFound(miss.path.to_string())
    }
}

impl Tree {
    /// Resolve a non-root folder path from the root.
    pub fn resolve(&self, path: &FolderPath) -> Result<Resolved<'_>, PathMiss> {
        let mut list: &[Folder] = &self.folders;
        let mut found: Option<Resolved<'_>> = None;
        for (depth, &index) in path.indices().iter().enumerate() {
            let Some(folder) = list.get(index) else {
                return Err(PathMiss {
                    path: path.clone(),
                    valid_prefix: FolderPath::new(path.indices()[..depth].to_vec()),
                });
            };
            found = Some(Resolved {
                folder,
                siblings: list,
                index,
            });
            list = &folder.folders;
        }
        found.ok_or_else(|| PathMiss {
            path: path.clone(),
            valid_prefix: FolderPath::root(),
        })
    }

    /// Longest prefix of `path` that still resolves.
    pub fn clamp(&self, path: &FolderPath) -> FolderPath {
        if path.is_root() {
            return FolderPath::root();
        }
        match self.resolve(path) {
            Ok(_) => path.clone(),
            Err(miss) => miss.valid_prefix,
        }
    }

    pub fn folder(&self, path: &FolderPath) -> Option<&Folder> {
        self.resolve(path).ok().map(|r| r.folder)
    }

    pub fn folder_mut(&mut self, path: &FolderPath) -> Option<&mut Folder> {
        let (first, rest) = path.indices().split_first()?;
        let mut folder = self.folders.get_mut(*first)?;
        for &index in rest {
            folder = folder.folders.get_mut(index)?;
        }
        Some(folder)
    }

    /// Child folder list at `path`; the root list for the root path.
    pub fn children(&self, path: &FolderPath) -> Option<&Vec<Folder>> {
        if path.is_root() {
            Some(&self.folders)
        } else {
            self.folder(path).map(|f| &f.folders)
        }
    }

    pub fn children_mut(&mut self, path: &FolderPath) -> Option<&mut Vec<Folder>> {
        if path.is_root() {
            Some(&mut self.folders)
        } else {
            self.folder_mut(path).map(|f| &mut f.folders)
        }
    }

    pub fn chat(&self, folder: &FolderPath, index: usize) -> Option<&Chat> {
        self.folder(folder).and_then(|f| f.chats.get(index))
    }

    pub fn chat_mut(&mut self, folder: &FolderPath, index: usize) -> Option<&mut Chat> {
        self.folder_mut(folder).and_then(|f| f.chats.get_mut(index))
    }

    /// Whether a node path currently points at something.
    pub fn contains(&self, path: &NodePath) -> bool {
        match path {
            NodePath::Folder(p) => !p.is_root() && self.folder(p).is_some(),
            NodePath::Chat { folder, index } => self.chat(folder, *index).is_some(),
        }
    }

    /// Human-readable breadcrumb of folder names along `path`.
    pub fn breadcrumb(&self, path: &FolderPath) -> Vec<String> {
        let mut names = Vec::new();
        let mut list: &[Folder] = &self.folders;
        for &index in path.indices() {
            match list.get(index) {
                Some(folder) => {
                    names.push(folder.name.clone());
                    list = &folder.folders;
                }
                None => break,
            }
        }
        names
    }
}
