//! Explicit view state: the tree plus everything a user has open, marked, or
//! staged. Each view owns its own `Session`, so independent sessions never
//! observe each other's directory, selection, or clipboard.

use serde::Deserialize;
use tracing::debug;

use crate::folders::clipboard::{ClipboardOp, ClipboardState, PasteReport};
use crate::folders::node::{Chat, Folder, ItemKind, NodeId, Tree};
use crate::folders::path::{FolderPath, NodePath};
use crate::folders::search::{self, SearchHit};
use crate::folders::selection::{Selection, SelectionKey};
use crate::folders::sort::{self, Named, SortMode};
use crate::folders::store::ChatPlacement;
use crate::folders::{FolderError, Result};

/// A node in the open directory.
#[derive(Debug, Clone, Copy)]
pub enum EntryItem<'a> {
    Folder(&'a Folder),
    Chat(&'a Chat),
}

/// One row of a directory listing, keyed by its original list index.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub key: SelectionKey,
    pub item: EntryItem<'a>,
}

impl Entry<'_> {
    pub fn id(&self) -> NodeId {
        match self.item {
            EntryItem::Folder(f) => f.id,
            EntryItem::Chat(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self.item {
            EntryItem::Folder(f) => &f.name,
            EntryItem::Chat(c) => &c.title,
        }
    }
}

impl Named for Entry<'_> {
    fn sort_name(&self) -> &str {
        self.name()
    }
}

/// Drag/drop payload: a folder reference by path, or a raw chat reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    Folder { path: FolderPath },
    Chat { url: String, title: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Folder {
        #[serde(rename = "type")]
        kind: String,
        path: String,
    },
    Chat {
        url: String,
        #[serde(default)]
        title: String,
    },
}

impl DropPayload {
    /// Parse the JSON wire form: `{"type":"folder","path":"0:1"}` or
    /// `{"url":"...","title":"..."}`.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawPayload = serde_json::from_str(text.trim())
            .map_err(|e| FolderError::BadPayload(e.to_string()))?;
        match raw {
            RawPayload::Folder { kind, path } if kind == "folder" => Ok(DropPayload::Folder {
                path: path.parse()?,
            }),
            RawPayload::Folder { kind, .. } => {
                Err(FolderError::BadPayload(format!("unknown type {:?}", kind)))
            }
            RawPayload::Chat { url, .. } if url.trim().is_empty() => {
                Err(FolderError::BadPayload("empty url".into()))
            }
            RawPayload::Chat { url, title } => Ok(DropPayload::Chat { url, title }),
        }
    }
}

/// Result of applying a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    MovedFolder(FolderPath),
    Chat(ChatPlacement),
}

/// What opening the first selected item did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    Folder(FolderPath),
    Chat { title: String, url: String },
}

#[derive(Debug, Clone)]
pub struct Session {
    tree: Tree,
    cwd: FolderPath,
    selection: Selection,
    pub clipboard: ClipboardState,
    pub search_term: String,
    pub sort: SortMode,
    base_url: String,
}

impl Session {
    pub fn new(tree: Tree, base_url: impl Into<String>) -> Self {
        Self {
            tree,
            cwd: FolderPath::root(),
            selection: Selection::new(),
            clipboard: ClipboardState::new(),
            search_term: String::new(),
            sort: SortMode::default(),
            base_url: base_url.into(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn current_dir(&self) -> &FolderPath {
        &self.cwd
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Folder names from the root down to the open directory.
    pub fn breadcrumb(&self) -> Vec<String> {
        self.tree.breadcrumb(&self.cwd)
    }

    fn navigate(&mut self, path: FolderPath) {
        if path != self.cwd {
            debug!("navigate {:?} -> {:?}", self.cwd.to_string(), path.to_string());
        }
        self.cwd = path;
        self.selection.clear();
    }

    /// Open the child folder at `index` of the current directory.
    pub fn open_folder(&mut self, index: usize) -> Result<()> {
        let path = self.cwd.child(index);
        if self.tree.folder(&path).is_none() {
            return Err(FolderError::NotFound(path.to_string()));
        }
        self.navigate(path);
        Ok(())
    }

    /// Go to the parent directory. Returns false at the root.
    pub fn go_up(&mut self) -> bool {
        match self.cwd.parent() {
            Some(parent) => {
                self.navigate(parent);
                true
            }
            None => false,
        }
    }

    /// Open any folder by path, leaving search.
    pub fn jump_to(&mut self, path: FolderPath) -> Result<()> {
        if !path.is_root() && self.tree.folder(&path).is_none() {
            return Err(FolderError::NotFound(path.to_string()));
        }
        self.search_term.clear();
        self.navigate(path);
        Ok(())
    }

    /// The open directory's folders then chats, each group ordered by the
    /// session's sort mode.
    pub fn listing(&self) -> Vec<Entry<'_>> {
        let Some(folder_list) = self.tree.children(&self.cwd) else {
            return Vec::new();
        };
        let folders = folder_list.iter().enumerate().map(|(i, f)| Entry {
            key: SelectionKey::folder(i),
            item: EntryItem::Folder(f),
        });
        let mut entries = sort::sorted(folders, self.sort);

        if let Some(owner) = self.tree.folder(&self.cwd) {
            let chats = owner.chats.iter().enumerate().map(|(i, c)| Entry {
                key: SelectionKey::chat(i),
                item: EntryItem::Chat(c),
            });
            entries.extend(sort::sorted(chats, self.sort));
        }
        entries
    }

    pub fn toggle_select(&mut self, key: SelectionKey, multi: bool) {
        self.selection.toggle(key, multi);
    }

    pub fn select_all(&mut self) {
        let keys: Vec<SelectionKey> = self.listing().iter().map(|e| e.key).collect();
        self.selection.select_all(keys);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn selected_paths(&self) -> Vec<NodePath> {
        self.selection.paths_in(&self.cwd)
    }

    pub fn copy_selected(&mut self) -> usize {
        let paths = self.selected_paths();
        self.clipboard.stage(&self.tree, &paths, ClipboardOp::Copy)
    }

    pub fn cut_selected(&mut self) -> usize {
        let paths = self.selected_paths();
        let staged = self.clipboard.stage(&self.tree, &paths, ClipboardOp::Cut);
        if staged > 0 {
            self.selection.clear();
        }
        staged
    }

    /// Paste the clipboard into the open directory.
    pub fn paste(&mut self) -> Result<PasteReport> {
        let was_cut = self.clipboard.operation == Some(ClipboardOp::Cut);
        let open = self.open_folder_id();
        let report = self.clipboard.paste(&mut self.tree, &self.cwd, &self.base_url)?;
        if was_cut {
            self.follow(open);
        }
        Ok(report)
    }

    /// Delete every selected item, highest index first.
    pub fn delete_selected(&mut self) -> usize {
        let paths = self.selected_paths();
        let removed = self.tree.delete_many(&paths);
        self.selection.clear();
        debug!("deleted {} of {} selected", removed, paths.len());
        removed
    }

    /// Open the first selected item: navigate into a folder, or hand back a
    /// chat to open externally.
    pub fn open_selected(&mut self) -> Option<Opened> {
        let key = self.selection.first()?;
        match key.kind {
            ItemKind::Folder => {
                self.open_folder(key.index).ok()?;
                Some(Opened::Folder(self.cwd.clone()))
            }
            ItemKind::Chat => {
                let chat = self.tree.chat(&self.cwd, key.index)?;
                Some(Opened::Chat {
                    title: chat.title.clone(),
                    url: chat.url.clone(),
                })
            }
        }
    }

    pub fn create_folder(&mut self, name: &str) -> Result<FolderPath> {
        self.tree.create_folder(&self.cwd, name)
    }

    fn locate(&self, id: NodeId) -> Result<NodePath> {
        self.tree
            .locate(id)
            .ok_or_else(|| FolderError::NotFound("the item no longer exists".into()))
    }

    fn locate_folder(&self, id: NodeId) -> Result<FolderPath> {
        match self.locate(id)? {
            NodePath::Folder(path) => Ok(path),
            NodePath::Chat { .. } => Err(FolderError::NotFound("the folder no longer exists".into())),
        }
    }

    /// Rename a folder or retitle a chat wherever it currently lives.
    pub fn rename_by_id(&mut self, id: NodeId, name: &str) -> Result<bool> {
        let path = self.locate(id)?;
        self.tree.rename(&path, name)
    }

    /// Remove a node wherever it currently lives.
    pub fn remove_by_id(&mut self, id: NodeId) -> Result<()> {
        let path = self.locate(id)?;
        let open = self.open_folder_id();
        self.tree.delete(&path)?;
        self.follow(open);
        Ok(())
    }

    pub fn set_icon(&mut self, id: NodeId, icon: &str) -> Result<()> {
        let path = self.locate_folder(id)?;
        self.tree.set_icon(&path, icon)
    }

    pub fn set_color(&mut self, id: NodeId, color: &str) -> Result<()> {
        let path = self.locate_folder(id)?;
        self.tree.set_color(&path, color)
    }

    /// Add a chat reference to the open directory.
    pub fn add_chat(&mut self, title: &str, url: &str) -> Result<ChatPlacement> {
        let chat = Chat::new(title.trim(), url.trim());
        self.tree.move_chat(chat, &self.cwd, &self.base_url)
    }

    /// Apply a drag/drop payload to the folder at `target`.
    pub fn apply_drop(&mut self, payload: DropPayload, target: &FolderPath) -> Result<DropOutcome> {
        let open = self.open_folder_id();
        let outcome = match payload {
            DropPayload::Folder { path } => {
                DropOutcome::MovedFolder(self.tree.move_folder(&path, target)?)
            }
            DropPayload::Chat { url, title } => {
                let title = if title.trim().is_empty() {
                    url.clone()
                } else {
                    title
                };
                DropOutcome::Chat(self.tree.move_chat(Chat::new(title, url), target, &self.base_url)?)
            }
        };
        self.follow(open);
        Ok(outcome)
    }

    /// Swap in a tree loaded from elsewhere. Nodes that still match keep
    /// their identity, so the open folder stays open where it can.
    pub fn replace_tree(&mut self, mut tree: Tree) {
        tree.adopt_ids(&self.tree);
        let open = self.open_folder_id();
        self.tree = tree;
        self.follow(open);
    }

    pub fn search(&self, term: &str) -> Vec<SearchHit<'_>> {
        search::search(&self.tree, term)
    }

    fn open_folder_id(&self) -> Option<NodeId> {
        self.tree.folder(&self.cwd).map(|f| f.id)
    }

    /// Reopen the folder `open` wherever it now lives, or the nearest valid
    /// directory when it is gone. Either way the selection is dropped.
    fn follow(&mut self, open: Option<NodeId>) {
        let path = match open.and_then(|id| self.tree.locate(id)) {
            Some(NodePath::Folder(path)) => path,
            _ => self.tree.clamp(&self.cwd),
        };
        self.navigate(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::sort::{SortDirection, SortField};

    const BASE: &str = "https://gemini.google.com";

    fn session() -> Session {
        let mut work = Folder::new("Work");
        work.folders.push(Folder::new("beta"));
        work.folders.push(Folder::new("Alpha"));
        work.chats.push(Chat::new("standup", "https://gemini.google.com/app/1"));
        work.chats.push(Chat::new("design", "https://gemini.google.com/app/2"));
        Session::new(Tree::new(vec![work, Folder::new("Home")]), BASE)
    }

    fn names(entries: &[Entry<'_>]) -> Vec<String> {
        entries.iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn listing_groups_folders_before_chats_and_sorts() {
        let mut s = session();
        s.open_folder(0).unwrap();
        assert_eq!(names(&s.listing()), vec!["Alpha", "beta", "design", "standup"]);
        s.sort = SortMode::new(SortField::Name, SortDirection::Desc);
        let listing = s.listing();
        assert_eq!(names(&listing), vec!["beta", "Alpha", "standup", "design"]);
        // Keys keep the underlying list positions.
        assert_eq!(listing[0].key, SelectionKey::folder(0));
        assert_eq!(listing[3].key, SelectionKey::chat(1));
    }

    #[test]
    fn root_listing_has_folders_only() {
        let s = session();
        assert_eq!(names(&s.listing()), vec!["Home", "Work"]);
    }

    #[test]
    fn navigation_clears_selection() {
        let mut s = session();
        s.toggle_select(SelectionKey::folder(1), false);
        s.open_folder(0).unwrap();
        assert!(s.selection().is_empty());
        s.toggle_select(SelectionKey::chat(0), false);
        assert!(s.go_up());
        assert!(s.selection().is_empty());
        assert!(!s.go_up());
        assert!(s.open_folder(9).is_err());
    }

    #[test]
    fn jump_to_clears_search_term() {
        let mut s = session();
        s.search_term = "alp".into();
        s.jump_to("0:1".parse().unwrap()).unwrap();
        assert_eq!(s.current_dir().to_string(), "0:1");
        assert!(s.search_term.is_empty());
        assert!(s.jump_to("4".parse().unwrap()).is_err());
    }

    #[test]
    fn select_all_covers_listing() {
        let mut s = session();
        s.open_folder(0).unwrap();
        s.select_all();
        assert_eq!(s.selection().len(), 4);
    }

    #[test]
    fn delete_selected_clears_selection() {
        let mut s = session();
        s.open_folder(0).unwrap();
        s.toggle_select(SelectionKey::folder(0), true);
        s.toggle_select(SelectionKey::chat(1), true);
        assert_eq!(s.delete_selected(), 2);
        assert!(s.selection().is_empty());
        assert_eq!(names(&s.listing()), vec!["Alpha", "standup"]);
    }

    #[test]
    fn cut_and_paste_between_folders() {
        let mut s = session();
        s.open_folder(0).unwrap();
        s.toggle_select(SelectionKey::chat(0), false);
        assert_eq!(s.cut_selected(), 1);
        assert!(s.selection().is_empty());
        s.go_up();
        s.open_folder(1).unwrap();
        let report = s.paste().unwrap();
        assert_eq!(report.pasted, 1);
        assert_eq!(s.tree().folders[1].chats[0].title, "standup");
        assert_eq!(s.tree().folders[0].chats.len(), 1);
        assert!(s.clipboard.is_empty());
    }

    #[test]
    fn independent_sessions_do_not_share_state() {
        let mut a = session();
        let b = session();
        a.open_folder(0).unwrap();
        a.toggle_select(SelectionKey::folder(0), false);
        a.copy_selected();
        assert!(b.current_dir().is_root());
        assert!(b.selection().is_empty());
        assert!(b.clipboard.is_empty());
    }

    #[test]
    fn open_selected_enters_folder_or_returns_chat() {
        let mut s = session();
        s.open_folder(0).unwrap();
        s.toggle_select(SelectionKey::chat(1), false);
        assert_eq!(
            s.open_selected(),
            Some(Opened::Chat {
                title: "design".into(),
                url: "https://gemini.google.com/app/2".into()
            })
        );
        s.toggle_select(SelectionKey::folder(1), false);
        assert_eq!(s.open_selected(), Some(Opened::Folder("0:1".parse().unwrap())));
        assert!(s.open_selected().is_none());
    }

    #[test]
    fn drop_payload_parses_both_shapes() {
        assert_eq!(
            DropPayload::parse(r#"{"type":"folder","path":"0:2"}"#).unwrap(),
            DropPayload::Folder {
                path: "0:2".parse().unwrap()
            }
        );
        assert_eq!(
            DropPayload::parse(r#"{"url":"/app/9","title":"T"}"#).unwrap(),
            DropPayload::Chat {
                url: "/app/9".into(),
                title: "T".into()
            }
        );
        assert!(matches!(
            DropPayload::parse(r#"{"type":"file","path":"0"}"#),
            Err(FolderError::BadPayload(_))
        ));
        assert!(DropPayload::parse("not json").is_err());
        assert!(DropPayload::parse(r#"{"type":"folder","path":"x"}"#).is_err());
    }

    #[test]
    fn drop_folder_and_chat() {
        let mut s = session();
        let moved = s
            .apply_drop(
                DropPayload::Folder {
                    path: "0:0".parse().unwrap(),
                },
                &"1".parse().unwrap(),
            )
            .unwrap();
        assert_eq!(moved, DropOutcome::MovedFolder("1:0".parse().unwrap()));

        let placed = s
            .apply_drop(
                DropPayload::Chat {
                    url: "/app/1".into(),
                    title: String::new(),
                },
                &"0".parse().unwrap(),
            )
            .unwrap();
        assert_eq!(
            placed,
            DropOutcome::Chat(ChatPlacement::AlreadyPresent {
                folder: "Work".into()
            })
        );

        assert!(s
            .apply_drop(
                DropPayload::Chat {
                    url: "/app/5".into(),
                    title: "x".into()
                },
                &FolderPath::root()
            )
            .is_err());
    }

    #[test]
    fn replace_tree_clamps_directory() {
        let mut s = session();
        s.jump_to("0:1".parse().unwrap()).unwrap();
        s.toggle_select(SelectionKey::chat(0), false);
        let mut smaller = Tree::new(vec![Folder::new("Work")]);
        smaller.folders[0].folders.push(Folder::new("only"));
        s.replace_tree(smaller);
        assert_eq!(s.current_dir().to_string(), "0");
        assert!(s.selection().is_empty());
    }

    fn abc() -> Session {
        let mut b = Folder::new("B");
        b.folders.push(Folder::new("inside B"));
        Session::new(Tree::new(vec![Folder::new("A"), b, Folder::new("C")]), BASE)
    }

    #[test]
    fn cut_paste_from_earlier_sibling_keeps_directory_open() {
        let mut s = abc();
        s.toggle_select(SelectionKey::folder(0), false);
        s.cut_selected();
        s.open_folder(1).unwrap();
        let report = s.paste().unwrap();
        assert_eq!(report.removed_originals, 1);
        assert_eq!(s.current_dir().to_string(), "0");
        assert_eq!(s.breadcrumb(), vec!["B"]);
        assert_eq!(names(&s.listing()), vec!["A", "inside B"]);
    }

    #[test]
    fn drop_from_earlier_sibling_keeps_directory_open() {
        let mut s = abc();
        s.open_folder(1).unwrap();
        s.apply_drop(
            DropPayload::Folder {
                path: "0".parse().unwrap(),
            },
            &"2".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(s.breadcrumb(), vec!["B"]);
        assert_eq!(s.tree().folders[1].folders[0].name, "A");
    }

    #[test]
    fn replace_tree_follows_the_open_folder() {
        let mut s = abc();
        s.open_folder(1).unwrap();
        let b_id = s.tree().folders[1].id;
        let mut b = Folder::new("B");
        b.folders.push(Folder::new("inside B"));
        s.replace_tree(Tree::new(vec![b, Folder::new("C")]));
        assert_eq!(s.current_dir().to_string(), "0");
        assert_eq!(s.tree().folders[0].id, b_id);
        assert!(s.rename_by_id(b_id, "B2").unwrap());
        assert_eq!(s.breadcrumb(), vec!["B2"]);
    }

    #[test]
    fn id_edits_reject_missing_nodes() {
        let mut s = abc();
        let a = s.tree().folders[0].id;
        s.toggle_select(SelectionKey::folder(0), false);
        s.delete_selected();
        assert!(matches!(s.set_icon(a, "⭐"), Err(FolderError::NotFound(_))));
        assert!(s.set_color(a, "red").is_err());
        assert!(s.rename_by_id(a, "x").is_err());
        assert_eq!(names(&s.listing()), vec!["B", "C"]);
    }

    #[test]
    fn id_operations_follow_moves() {
        let mut s = session();
        let id = s.tree().folders[0].chats[1].id;
        s.open_folder(0).unwrap();
        s.toggle_select(SelectionKey::chat(0), false);
        s.delete_selected();
        assert!(s.rename_by_id(id, "renamed").unwrap());
        assert_eq!(s.tree().folders[0].chats[0].title, "renamed");
        s.remove_by_id(id).unwrap();
        assert!(s.tree().folders[0].chats.is_empty());
        assert!(s.remove_by_id(id).is_err());
    }

    #[test]
    fn add_chat_requires_a_folder() {
        let mut s = session();
        assert!(s.add_chat("t", "/app/3").is_err());
        s.open_folder(1).unwrap();
        assert_eq!(
            s.add_chat(" t ", "/app/3").unwrap(),
            ChatPlacement::Added {
                folder: "Home".into()
            }
        );
        assert_eq!(s.tree().folders[1].chats[0].url, "https://gemini.google.com/app/3");
        assert_eq!(s.tree().folders[1].chats[0].title, "t");
    }
}
