use tracing::debug;

use crate::folders::node::{Chat, Folder, Tree};
use crate::folders::path::{FolderPath, NodePath};
use crate::folders::{FolderError, Placement, Result};

/// Absolute form of a chat URL. Host-relative URLs (`/app/abc`) are joined
/// onto `base_url`; anything else is returned unchanged.
pub fn normalize_chat_url(url: &str, base_url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// First name not already taken among `siblings`: `name`, then `name (1)`,
/// `name (2)`, ...
pub fn unique_name(siblings: &[Folder], name: &str) -> String {
    let taken = |candidate: &str| siblings.iter().any(|f| f.name == candidate);
    if !taken(name) {
        return name.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{} ({})", name, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// What happened when a chat was dropped on a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPlacement {
    Added { folder: String },
    AlreadyPresent { folder: String },
}

impl Tree {
    /// Append a new empty folder under `parent`.
    ///
    /// Sibling names are not checked here; only paste resolves collisions.
    pub fn create_folder(&mut self, parent: &FolderPath, name: &str) -> Result<FolderPath> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FolderError::EmptyName);
        }
        let list = self
            .children_mut(parent)
            .ok_or_else(|| FolderError::NotFound(parent.to_string()))?;
        list.push(Folder::new(name));
        let created = parent.child(list.len() - 1);
        debug!("created folder {:?} at {}", name, created);
        Ok(created)
    }

    /// Rename a folder or retitle a chat.
    ///
    /// Returns `Ok(false)` without touching anything when the trimmed name is
    /// empty. Sibling collisions are not checked.
    pub fn rename(&mut self, path: &NodePath, new_name: &str) -> Result<bool> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Ok(false);
        }
        match path {
            NodePath::Folder(p) => {
                let folder = self
                    .folder_mut(p)
                    .ok_or_else(|| FolderError::NotFound(p.to_string()))?;
                folder.name = new_name.to_string();
            }
            NodePath::Chat { folder, index } => {
                let chat = self
                    .chat_mut(folder, *index)
                    .ok_or_else(|| FolderError::NotFound(path.to_string()))?;
                chat.title = new_name.to_string();
            }
        }
        Ok(true)
    }

    /// Splice a folder out of its parent list.
    pub fn delete_folder(&mut self, path: &FolderPath) -> Result<Folder> {
        let index = path
            .last()
            .ok_or_else(|| FolderError::NotFound(path.to_string()))?;
        let parent = path.parent().unwrap_or_default();
        let list = self
            .children_mut(&parent)
            .filter(|list| index < list.len())
            .ok_or_else(|| FolderError::NotFound(path.to_string()))?;
        Ok(list.remove(index))
    }

    /// Splice a chat out of its owning folder.
    pub fn delete_chat(&mut self, folder: &FolderPath, index: usize) -> Result<Chat> {
        let owner = self
            .folder_mut(folder)
            .filter(|f| index < f.chats.len())
            .ok_or_else(|| {
                FolderError::NotFound(
                    NodePath::Chat {
                        folder: folder.clone(),
                        index,
                    }
                    .to_string(),
                )
            })?;
        Ok(owner.chats.remove(index))
    }

    pub fn delete(&mut self, path: &NodePath) -> Result<()> {
        match path {
            NodePath::Folder(p) => self.delete_folder(p).map(|_| ()),
            NodePath::Chat { folder, index } => self.delete_chat(folder, *index).map(|_| ()),
        }
    }

    /// Delete a batch of nodes.
    ///
    /// The batch is processed highest index first so that removals from a
    /// shared parent list never shift an index that is still pending.
    /// Missing nodes are skipped. Returns how many were removed.
    pub fn delete_many(&mut self, paths: &[NodePath]) -> usize {
        let mut ordered: Vec<&NodePath> = paths.iter().collect();
        ordered.sort_by(|a, b| b.index().cmp(&a.index()));
        ordered
            .into_iter()
            .filter(|path| self.delete(path).is_ok())
            .count()
    }

    /// Move a folder into the target folder's children (or to the root).
    ///
    /// Rejected when the target is the source itself or any descendant of it.
    pub fn move_folder(&mut self, source: &FolderPath, target: &FolderPath) -> Result<FolderPath> {
        if source.is_root() {
            return Err(FolderError::NotFound(source.to_string()));
        }
        if target.is_within(source) {
            return Err(FolderError::InvalidPlacement(Placement::IntoOwnSubtree));
        }
        if self.children(target).is_none() {
            return Err(FolderError::NotFound(target.to_string()));
        }
        let moved = self.delete_folder(source)?;
        let moved_id = moved.id;

        // The target was resolved before the splice; removing the source may
        // have shifted it, so resolve it again through the identity of the
        // target folder where one exists.
        let target = self.shift_after_removal(source, target);
        let list = self
            .children_mut(&target)
            .ok_or_else(|| FolderError::NotFound(target.to_string()))?;
        list.push(moved);
        debug!("moved folder {} into {:?}", source, target.to_string());
        match self.locate(moved_id) {
            Some(NodePath::Folder(p)) => Ok(p),
            _ => Err(FolderError::NotFound(target.to_string())),
        }
    }

    /// Adjust `target` for the removal of the folder at `removed`.
    ///
    /// Only a target that runs through a later sibling of `removed` moves:
    /// its index at that depth drops by one.
    fn shift_after_removal(&self, removed: &FolderPath, target: &FolderPath) -> FolderPath {
        let depth = removed.depth() - 1;
        let parent = &removed.indices()[..depth];
        let mut indices = target.indices().to_vec();
        if indices.len() > depth && indices[..depth] == *parent {
            if let Some(removed_index) = removed.last() {
                if indices[depth] > removed_index {
                    indices[depth] -= 1;
                }
            }
        }
        FolderPath::new(indices)
    }

    /// Add a chat reference to a folder, de-duplicating by URL.
    pub fn move_chat(
        &mut self,
        chat: Chat,
        target: &FolderPath,
        base_url: &str,
    ) -> Result<ChatPlacement> {
        if target.is_root() {
            return Err(FolderError::InvalidPlacement(Placement::ChatAtRoot));
        }
        let folder = self
            .folder_mut(target)
            .ok_or_else(|| FolderError::NotFound(target.to_string()))?;
        let url = normalize_chat_url(&chat.url, base_url);
        if folder.chats.iter().any(|c| c.url == url) {
            return Ok(ChatPlacement::AlreadyPresent {
                folder: folder.name.clone(),
            });
        }
        folder.chats.push(Chat { url, ..chat });
        Ok(ChatPlacement::Added {
            folder: folder.name.clone(),
        })
    }

    pub fn set_icon(&mut self, path: &FolderPath, icon: &str) -> Result<()> {
        let folder = self
            .folder_mut(path)
            .ok_or_else(|| FolderError::NotFound(path.to_string()))?;
        folder.icon = icon.to_string();
        Ok(())
    }

    /// Tag a folder with a color name; `"default"` clears the tag.
    pub fn set_color(&mut self, path: &FolderPath, color: &str) -> Result<()> {
        let folder = self
            .folder_mut(path)
            .ok_or_else(|| FolderError::NotFound(path.to_string()))?;
        folder.color = match color {
            "" | "default" => None,
            other => Some(other.to_string()),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://gemini.google.com";

    fn names(list: &[Folder]) -> Vec<&str> {
        list.iter().map(|f| f.name.as_str()).collect()
    }

    fn fp(s: &str) -> FolderPath {
        s.parse().unwrap()
    }

    fn nested() -> Tree {
        let mut a = Folder::new("a");
        let mut a0 = Folder::new("a0");
        a0.folders.push(Folder::new("a00"));
        a.folders.push(a0);
        a.folders.push(Folder::new("a1"));
        Tree::new(vec![a, Folder::new("b"), Folder::new("c")])
    }

    #[test]
    fn unique_name_appends_smallest_free_counter() {
        let siblings = vec![Folder::new("X"), Folder::new("X (1)"), Folder::new("Y")];
        assert_eq!(unique_name(&siblings, "Z"), "Z");
        assert_eq!(unique_name(&siblings, "X"), "X (2)");
        assert_eq!(unique_name(&siblings, "Y"), "Y (1)");
    }

    #[test]
    fn normalize_joins_relative_urls_only() {
        assert_eq!(normalize_chat_url("/app/1", BASE), "https://gemini.google.com/app/1");
        assert_eq!(
            normalize_chat_url("https://other/app/1", BASE),
            "https://other/app/1"
        );
        assert_eq!(
            normalize_chat_url("/app/1", "https://gemini.google.com/"),
            "https://gemini.google.com/app/1"
        );
    }

    #[test]
    fn create_folder_appends_with_default_icon() {
        let mut tree = Tree::default();
        let path = tree.create_folder(&FolderPath::root(), "  Work ").unwrap();
        assert_eq!(path.to_string(), "0");
        assert_eq!(tree.folders[0].name, "Work");
        assert_eq!(tree.folders[0].icon, "📁");
        let inner = tree.create_folder(&path, "Inner").unwrap();
        assert_eq!(inner.to_string(), "0:0");
    }

    #[test]
    fn create_folder_does_not_deduplicate_names() {
        let mut tree = Tree::new(vec![Folder::new("Work")]);
        tree.create_folder(&FolderPath::root(), "Work").unwrap();
        assert_eq!(names(&tree.folders), vec!["Work", "Work"]);
    }

    #[test]
    fn create_folder_rejects_empty_name_and_missing_parent() {
        let mut tree = Tree::default();
        assert_eq!(
            tree.create_folder(&FolderPath::root(), "   "),
            Err(FolderError::EmptyName)
        );
        assert!(matches!(
            tree.create_folder(&fp("3"), "x"),
            Err(FolderError::NotFound(_))
        ));
    }

    #[test]
    fn rename_trims_and_ignores_empty() {
        let mut tree = nested();
        assert!(tree.rename(&NodePath::Folder(fp("1")), "  New ").unwrap());
        assert_eq!(tree.folders[1].name, "New");
        assert!(!tree.rename(&NodePath::Folder(fp("1")), "   ").unwrap());
        assert_eq!(tree.folders[1].name, "New");
    }

    #[test]
    fn rename_allows_sibling_collisions() {
        let mut tree = nested();
        tree.rename(&NodePath::Folder(fp("1")), "c").unwrap();
        assert_eq!(names(&tree.folders), vec!["a", "c", "c"]);
    }

    #[test]
    fn rename_chat_sets_title() {
        let mut tree = nested();
        tree.folders[1].chats.push(Chat::new("old", "https://x/1"));
        tree.rename(&"1:c:0".parse().unwrap(), "new").unwrap();
        assert_eq!(tree.folders[1].chats[0].title, "new");
    }

    #[test]
    fn delete_many_descending_keeps_the_others() {
        let mut tree = Tree::new(
            ["f0", "f1", "f2", "f3", "f4"]
                .iter()
                .map(|n| Folder::new(*n))
                .collect(),
        );
        // Deliberately not in index order.
        let batch: Vec<NodePath> = ["2", "0", "4"]
            .iter()
            .map(|s| NodePath::Folder(fp(s)))
            .collect();
        assert_eq!(tree.delete_many(&batch), 3);
        assert_eq!(names(&tree.folders), vec!["f1", "f3"]);
    }

    #[test]
    fn delete_many_mixes_folders_and_chats() {
        let mut tree = nested();
        for i in 0..3 {
            tree.folders[1]
                .chats
                .push(Chat::new(format!("c{}", i), format!("https://x/{}", i)));
        }
        tree.folders[1].folders.push(Folder::new("sub0"));
        tree.folders[1].folders.push(Folder::new("sub1"));
        let batch: Vec<NodePath> = ["1:c:0", "1:0", "1:c:2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(tree.delete_many(&batch), 3);
        let b = &tree.folders[1];
        assert_eq!(b.chats.len(), 1);
        assert_eq!(b.chats[0].title, "c1");
        assert_eq!(names(&b.folders), vec!["sub1"]);
    }

    #[test]
    fn delete_missing_node_is_not_found() {
        let mut tree = nested();
        assert!(tree.delete_folder(&fp("7")).is_err());
        assert!(tree.delete_chat(&fp("0"), 0).is_err());
        assert_eq!(tree.folders.len(), 3);
    }

    #[test]
    fn move_folder_into_itself_or_descendant_is_rejected() {
        let mut tree = nested();
        let before = tree.clone();
        for target in ["0", "0:0", "0:0:0", "0:1"] {
            assert_eq!(
                tree.move_folder(&fp("0"), &fp(target)),
                Err(FolderError::InvalidPlacement(Placement::IntoOwnSubtree)),
                "target {}",
                target
            );
            assert_eq!(tree, before);
        }
    }

    #[test]
    fn move_folder_into_sibling_prefix_is_allowed() {
        // "10" starts with "1" textually but is not beneath "1".
        let mut tree = Tree::new((0..11).map(|i| Folder::new(format!("f{}", i))).collect());
        let moved = tree.move_folder(&fp("1"), &fp("10")).unwrap();
        assert_eq!(moved.to_string(), "9:0");
        assert_eq!(tree.folders[9].name, "f10");
        assert_eq!(tree.folders[9].folders[0].name, "f1");
    }

    #[test]
    fn move_folder_adjusts_for_shifted_target() {
        let mut tree = nested();
        // Moving "a" (index 0) into "c" (index 2): after the splice, "c" sits at 1.
        let moved = tree.move_folder(&fp("0"), &fp("2")).unwrap();
        assert_eq!(names(&tree.folders), vec!["b", "c"]);
        assert_eq!(tree.folders[1].folders[0].name, "a");
        assert_eq!(moved.to_string(), "1:0");
    }

    #[test]
    fn move_folder_to_earlier_target_and_root() {
        let mut tree = nested();
        tree.move_folder(&fp("2"), &fp("0:1")).unwrap();
        assert_eq!(names(&tree.folders), vec!["a", "b"]);
        assert_eq!(tree.folders[0].folders[1].folders[0].name, "c");

        let moved = tree.move_folder(&fp("0:0:0"), &FolderPath::root()).unwrap();
        assert_eq!(moved.to_string(), "2");
        assert_eq!(names(&tree.folders), vec!["a", "b", "a00"]);
    }

    #[test]
    fn move_folder_with_missing_target_leaves_tree_unchanged() {
        let mut tree = nested();
        let before = tree.clone();
        assert!(tree.move_folder(&fp("1"), &fp("9")).is_err());
        assert_eq!(tree, before);
    }

    #[test]
    fn move_chat_rejects_root() {
        let mut tree = nested();
        assert_eq!(
            tree.move_chat(Chat::new("t", "/app/1"), &FolderPath::root(), BASE),
            Err(FolderError::InvalidPlacement(Placement::ChatAtRoot))
        );
    }

    #[test]
    fn move_chat_normalizes_and_deduplicates_by_url() {
        let mut tree = nested();
        let placed = tree
            .move_chat(Chat::new("t", "/app/1"), &fp("1"), BASE)
            .unwrap();
        assert_eq!(placed, ChatPlacement::Added { folder: "b".into() });
        assert_eq!(tree.folders[1].chats[0].url, "https://gemini.google.com/app/1");

        let again = tree
            .move_chat(
                Chat::new("other title", "https://gemini.google.com/app/1"),
                &fp("1"),
                BASE,
            )
            .unwrap();
        assert_eq!(again, ChatPlacement::AlreadyPresent { folder: "b".into() });
        assert_eq!(tree.folders[1].chats.len(), 1);
    }

    #[test]
    fn set_icon_and_color() {
        let mut tree = nested();
        tree.set_icon(&fp("0:1"), "🚀").unwrap();
        tree.set_color(&fp("0:1"), "red").unwrap();
        assert_eq!(tree.folders[0].folders[1].icon, "🚀");
        assert_eq!(tree.folders[0].folders[1].color.as_deref(), Some("red"));
        tree.set_color(&fp("0:1"), "default").unwrap();
        assert!(tree.folders[0].folders[1].color.is_none());
        assert!(tree.set_icon(&fp("5"), "x").is_err());
    }
}
