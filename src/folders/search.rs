use crate::folders::node::{Chat, Folder, ItemKind, Tree};
use crate::folders::path::{FolderPath, NodePath};
use crate::folders::sort::Named;

/// The node a search hit refers to.
#[derive(Debug, Clone, Copy)]
pub enum HitNode<'a> {
    Folder(&'a Folder),
    Chat(&'a Chat),
}

/// One match, annotated with the path it was found at.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub node: HitNode<'a>,
    pub path: NodePath,
}

impl SearchHit<'_> {
    pub fn kind(&self) -> ItemKind {
        self.path.kind()
    }

    pub fn name(&self) -> &str {
        match self.node {
            HitNode::Folder(f) => &f.name,
            HitNode::Chat(c) => &c.title,
        }
    }

    /// Directory to open to see this hit: the folder itself, or the chat's owner.
    pub fn open_dir(&self) -> FolderPath {
        match &self.path {
            NodePath::Folder(p) => p.clone(),
            NodePath::Chat { folder, .. } => folder.clone(),
        }
    }
}

impl Named for SearchHit<'_> {
    fn sort_name(&self) -> &str {
        self.name()
    }
}

/// Depth-first search over the whole tree.
///
/// Folders match on name, chats on title, both case-insensitive substring.
/// A matching folder is still descended into. A blank term matches nothing.
pub fn search<'a>(tree: &'a Tree, term: &str) -> Vec<SearchHit<'a>> {
    let needle = term.trim().to_lowercase();
    let mut hits = Vec::new();
    if needle.is_empty() {
        return hits;
    }
    walk(&tree.folders, &FolderPath::root(), &needle, &mut hits);
    hits
}

fn walk<'a>(folders: &'a [Folder], parent: &FolderPath, needle: &str, hits: &mut Vec<SearchHit<'a>>) {
    for (i, folder) in folders.iter().enumerate() {
        let path = parent.child(i);
        if folder.name.to_lowercase().contains(needle) {
            hits.push(SearchHit {
                node: HitNode::Folder(folder),
                path: NodePath::Folder(path.clone()),
            });
        }
        for (ci, chat) in folder.chats.iter().enumerate() {
            if chat.title.to_lowercase().contains(needle) {
                hits.push(SearchHit {
                    node: HitNode::Chat(chat),
                    path: NodePath::Chat {
                        folder: path.clone(),
                        index: ci,
                    },
                });
            }
        }
        walk(&folder.folders, &path, needle, hits);
    }
}
