use tracing::debug;

use crate::folders::node::{Chat, Folder, ItemKind, NodeId, Tree};
use crate::folders::path::{FolderPath, NodePath};
use crate::folders::store::{unique_name, ChatPlacement};
use crate::folders::{FolderError, Result};

/// The type of clipboard operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Copy,
    Cut,
}

/// Copy of a node taken when it was staged.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Folder(Folder),
    Chat(Chat),
}

/// One staged node: its identity, snapshot, and where it was staged from.
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub id: NodeId,
    pub snapshot: Snapshot,
    pub origin: NodePath,
    pub origin_index: usize,
}

impl ClipboardItem {
    pub fn kind(&self) -> ItemKind {
        match self.snapshot {
            Snapshot::Folder(_) => ItemKind::Folder,
            Snapshot::Chat(_) => ItemKind::Chat,
        }
    }
}

/// Tally of a paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteReport {
    pub pasted: usize,
    /// Chats skipped because the target was the root.
    pub skipped_root_chats: usize,
    /// Chats skipped because the target already held their URL.
    pub duplicates: usize,
    /// Cut folders refused because the target lies inside them.
    pub rejected_cycles: usize,
    /// Cut originals removed after pasting.
    pub removed_originals: usize,
}

impl PasteReport {
    /// Short user-facing summary.
    pub fn message(&self) -> String {
        let mut msg = format!("Pasted {} item(s)", self.pasted);
        if self.skipped_root_chats > 0 {
            msg.push_str(". Cannot paste chats at the root, open a folder");
        }
        if self.rejected_cycles > 0 {
            msg.push_str(". Cannot move a folder into itself");
        }
        if self.duplicates > 0 {
            msg.push_str(&format!(". {} already in folder", self.duplicates));
        }
        msg
    }
}

/// Staging area for copy/cut. Survives navigation; a copy stays for repeated
/// pastes, a cut is consumed by its first paste.
#[derive(Debug, Clone)]
pub struct ClipboardState {
    pub items: Vec<ClipboardItem>,
    pub operation: Option<ClipboardOp>,
}

impl Default for ClipboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardState {
    /// Create a new empty clipboard.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            operation: None,
        }
    }

    /// Replace the clipboard contents.
    pub fn set(&mut self, items: Vec<ClipboardItem>, op: ClipboardOp) {
        self.items = items;
        self.operation = Some(op);
    }

    /// Clear the clipboard.
    pub fn clear(&mut self) {
        self.items.clear();
        self.operation = None;
    }

    /// Whether the clipboard has content.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in the clipboard.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the node is waiting to be moved by a cut.
    pub fn is_cut(&self, id: NodeId) -> bool {
        self.operation == Some(ClipboardOp::Cut) && self.items.iter().any(|i| i.id == id)
    }

    /// Snapshot the nodes at `paths` and stage them, replacing the previous
    /// contents. Paths that do not resolve are skipped; when none resolve the
    /// clipboard is left untouched. Returns the number staged.
    pub fn stage(&mut self, tree: &Tree, paths: &[NodePath], op: ClipboardOp) -> usize {
        let items: Vec<ClipboardItem> = paths
            .iter()
            .filter_map(|path| {
                let origin_index = path.index()?;
                let (id, snapshot) = match path {
                    NodePath::Folder(p) => {
                        let folder = tree.folder(p)?;
                        (folder.id, Snapshot::Folder(folder.clone()))
                    }
                    NodePath::Chat { folder, index } => {
                        let chat = tree.chat(folder, *index)?;
                        (chat.id, Snapshot::Chat(chat.clone()))
                    }
                };
                Some(ClipboardItem {
                    id,
                    snapshot,
                    origin: path.clone(),
                    origin_index,
                })
            })
            .collect();
        let count = items.len();
        if count > 0 {
            self.set(items, op);
            debug!("staged {} item(s) for {:?}", count, op);
        }
        count
    }

    /// Where a staged node lives now.
    ///
    /// Identity first. If the tree was replaced since staging the identity is
    /// gone, so fall back to the origin path, accepting it only when the node
    /// there still matches the snapshot.
    fn current_location(tree: &Tree, item: &ClipboardItem) -> Option<NodePath> {
        if let Some(path) = tree.locate(item.id) {
            return Some(path);
        }
        let unchanged = match (&item.snapshot, &item.origin) {
            (Snapshot::Folder(snap), NodePath::Folder(p)) => tree.folder(p) == Some(snap),
            (Snapshot::Chat(snap), NodePath::Chat { folder, index }) => {
                tree.chat(folder, *index) == Some(snap)
            }
            _ => false,
        };
        unchanged.then(|| item.origin.clone())
    }

    /// Paste into the folder at `target` (or the root).
    ///
    /// Folders are deep-copied with fresh identities and renamed on sibling
    /// collision. Chats are skipped at the root and when the target already
    /// holds their URL. For a cut, every placed item's original is then
    /// located afresh and removed one by one, and the clipboard is cleared.
    pub fn paste(&mut self, tree: &mut Tree, target: &FolderPath, base_url: &str) -> Result<PasteReport> {
        let mut report = PasteReport::default();
        if self.is_empty() {
            return Ok(report);
        }
        if tree.children(target).is_none() {
            return Err(FolderError::NotFound(target.to_string()));
        }
        let op = self.operation.unwrap_or(ClipboardOp::Copy);
        let mut placed = Vec::new();

        for (i, item) in self.items.iter().enumerate() {
            match &item.snapshot {
                Snapshot::Folder(folder) => {
                    if op == ClipboardOp::Cut {
                        if let Some(NodePath::Folder(current)) = Self::current_location(tree, item) {
                            if target.is_within(&current) {
                                report.rejected_cycles += 1;
                                continue;
                            }
                        }
                    }
                    let siblings = tree
                        .children_mut(target)
                        .ok_or_else(|| FolderError::NotFound(target.to_string()))?;
                    let mut copy = folder.duplicate();
                    copy.name = unique_name(siblings, &copy.name);
                    siblings.push(copy);
                    report.pasted += 1;
                    placed.push(i);
                }
                Snapshot::Chat(chat) => {
                    if target.is_root() {
                        report.skipped_root_chats += 1;
                        continue;
                    }
                    match tree.move_chat(chat.duplicate(), target, base_url)? {
                        ChatPlacement::Added { .. } => {
                            report.pasted += 1;
                            placed.push(i);
                        }
                        ChatPlacement::AlreadyPresent { .. } => report.duplicates += 1,
                    }
                }
            }
        }

        if op == ClipboardOp::Cut {
            for i in placed {
                let item = &self.items[i];
                if let Some(path) = Self::current_location(tree, item) {
                    if tree.delete(&path).is_ok() {
                        report.removed_originals += 1;
                    }
                }
            }
            self.clear();
        }
        debug!("paste into {:?}: {:?}", target.to_string(), report);
        Ok(report)
    }
}
