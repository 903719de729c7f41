use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::folders::path::{FolderPath, NodePath};

/// Icon given to folders that were created without one.
pub const DEFAULT_FOLDER_ICON: &str = "📁";

/// Icons offered by the icon picker.
pub const FOLDER_ICONS: &[&str] = &[
    "😀", "😊", "🥰", "😎", "🤓", "🤔", "😴", "🥳", "👍", "👎", "👏", "🙌", "💪", "🤝", "✌️",
    "🤞", "❤️", "🧡", "💛", "💚", "💙", "💜", "🖤", "🤍", "📁", "📂", "🗂️", "📚", "📖", "📝",
    "✏️", "📌", "⭐", "💡", "🔥", "💼", "🎯", "🚀", "💻", "🔧", "🎨", "🎬", "🎵", "📷", "🌟",
    "💎", "🏠", "🔒", "🌈", "☀️", "🌙", "⚡", "🌸", "🍀", "🌲", "🌊",
];

/// Color names a folder can be tagged with.
pub const FOLDER_COLORS: &[&str] = &[
    "default", "red", "orange", "yellow", "green", "blue", "purple", "pink", "grey",
];

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a folder or chat.
///
/// Ids are not persisted. Every node gets a fresh one when it is created or
/// deserialized, so an id stays valid for as long as the node it was read
/// from is alive in memory. A reloaded tree can take over the ids of the
/// nodes it shares with the previous one through [`Tree::adopt_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Parse a stored list entry by entry. Entries that do not parse are
/// skipped, a `null` or missing list reads as empty.
fn read_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            warn!("expected a list, found {}", other);
            return Vec::new();
        }
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .collect()
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(read_list(Value::deserialize(deserializer)?))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn icon_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_icon))
}

/// Kind of item a node path, selection key, or clipboard entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Folder,
    Chat,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Chat => "chat",
        }
    }
}

/// A leaf reference to an external conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    #[serde(skip, default = "NodeId::fresh")]
    pub id: NodeId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

impl Chat {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            title: title.into(),
            url: url.into(),
        }
    }

    /// Clone with a new identity.
    pub fn duplicate(&self) -> Self {
        Self::new(self.title.clone(), self.url.clone())
    }
}

/// Structural equality: identity is ignored.
impl PartialEq for Chat {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.url == other.url
    }
}

fn default_icon() -> String {
    DEFAULT_FOLDER_ICON.to_string()
}

/// A named node holding child folders and chats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    #[serde(skip, default = "NodeId::fresh")]
    pub id: NodeId,
    pub name: String,
    #[serde(default = "default_icon", deserialize_with = "icon_or_default")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub chats: Vec<Chat>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub folders: Vec<Folder>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            name: name.into(),
            icon: default_icon(),
            color: None,
            chats: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Deep clone of the whole subtree, every node getting a new identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: NodeId::fresh(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            color: self.color.clone(),
            chats: self.chats.iter().map(Chat::duplicate).collect(),
            folders: self.folders.iter().map(Folder::duplicate).collect(),
        }
    }

    /// Number of folders and chats in this subtree, excluding the folder itself.
    pub fn descendant_count(&self) -> usize {
        self.chats.len()
            + self
                .folders
                .iter()
                .map(|f| 1 + f.descendant_count())
                .sum::<usize>()
    }
}

/// Structural equality: identity is ignored.
impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.icon == other.icon
            && self.color == other.color
            && self.chats == other.chats
            && self.folders == other.folders
    }
}

/// The persisted root aggregate. The root holds folders only, never chats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default, deserialize_with = "lenient_list")]
    pub folders: Vec<Folder>,
}

impl Tree {
    pub fn new(folders: Vec<Folder>) -> Self {
        Self { folders }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Build a tree from stored JSON, migrating the legacy layout.
    ///
    /// The legacy layout keyed folders by name (`{"folders": {"Work": [chats]}}`).
    /// A `null` child list reads as empty and an unreadable folder or chat is
    /// skipped on its own. Anything that is neither layout yields an empty tree.
    pub fn from_value(value: Value) -> Tree {
        match value.get("folders") {
            Some(Value::Array(_)) => match serde_json::from_value::<Tree>(value) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("discarding unreadable folder data: {}", e);
                    Tree::default()
                }
            },
            Some(Value::Object(map)) => {
                let folders = map
                    .iter()
                    .map(|(name, chats)| {
                        let mut folder = Folder::new(name.clone());
                        folder.chats = read_list(chats.clone());
                        folder
                    })
                    .collect();
                info!("migrated legacy name-keyed folder data");
                Tree { folders }
            }
            _ => Tree::default(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Find the current path of the node with the given identity.
    ///
    /// Walks from the root every call, so the returned path reflects every
    /// mutation made so far.
    pub fn locate(&self, id: NodeId) -> Option<NodePath> {
        fn walk(folders: &[Folder], prefix: &mut Vec<usize>, id: NodeId) -> Option<NodePath> {
            for (i, folder) in folders.iter().enumerate() {
                prefix.push(i);
                if folder.id == id {
                    return Some(NodePath::Folder(FolderPath::new(prefix.clone())));
                }
                if let Some(ci) = folder.chats.iter().position(|c| c.id == id) {
                    return Some(NodePath::Chat {
                        folder: FolderPath::new(prefix.clone()),
                        index: ci,
                    });
                }
                if let Some(found) = walk(&folder.folders, prefix, id) {
                    return Some(found);
                }
                prefix.pop();
            }
            None
        }
        walk(&self.folders, &mut Vec::new(), id)
    }

    /// Carry identities over from `old` to the nodes of this tree that
    /// match under an already matched parent: folders by name, chats by URL.
    /// Unmatched nodes keep their fresh ids.
    pub fn adopt_ids(&mut self, old: &Tree) {
        adopt_folder_ids(&mut self.folders, &old.folders);
    }

    /// Total number of folders and chats.
    pub fn node_count(&self) -> usize {
        self.folders.iter().map(|f| 1 + f.descendant_count()).sum()
    }
}

fn adopt_folder_ids(new: &mut [Folder], old: &[Folder]) {
    let mut taken = vec![false; old.len()];
    for folder in new.iter_mut() {
        let Some(i) = (0..old.len()).find(|&i| !taken[i] && old[i].name == folder.name) else {
            continue;
        };
        taken[i] = true;
        folder.id = old[i].id;
        adopt_chat_ids(&mut folder.chats, &old[i].chats);
        adopt_folder_ids(&mut folder.folders, &old[i].folders);
    }
}

fn adopt_chat_ids(new: &mut [Chat], old: &[Chat]) {
    let mut taken = vec![false; old.len()];
    for chat in new.iter_mut() {
        if let Some(i) = (0..old.len()).find(|&i| !taken[i] && old[i].url == chat.url) {
            taken[i] = true;
            chat.id = old[i].id;
        }
    }
}
