//! In-memory folder hierarchy and the operations that mutate it.

pub mod clipboard;
pub mod node;
pub mod path;
pub mod search;
pub mod selection;
pub mod session;
pub mod sort;
pub mod store;

use thiserror::Error;

pub use node::{Chat, Folder, ItemKind, NodeId, Tree};
pub use path::{FolderPath, NodePath};

/// Result alias for folder operations.
pub type Result<T> = std::result::Result<T, FolderError>;

/// Structural placements that are never allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Chats need an owning folder; the root holds folders only.
    ChatAtRoot,
    /// A folder cannot be moved to or beneath its own path.
    IntoOwnSubtree,
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::ChatAtRoot => write!(f, "Cannot place chats at the root. Open a folder first."),
            Placement::IntoOwnSubtree => write!(f, "Cannot move a folder into itself"),
        }
    }
}

/// Failures reported by folder operations. None of them leave the tree
/// partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderError {
    /// Path resolution missed.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidPlacement(Placement),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid path: {0}")]
    BadPath(String),

    /// Drag/drop payload that is neither a folder nor a chat reference.
    #[error("Invalid drop payload: {0}")]
    BadPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_messages_are_user_facing() {
        assert_eq!(
            FolderError::InvalidPlacement(Placement::IntoOwnSubtree).to_string(),
            "Cannot move a folder into itself"
        );
        assert!(FolderError::InvalidPlacement(Placement::ChatAtRoot)
            .to_string()
            .contains("root"));
    }

    #[test]
    fn not_found_display() {
        assert_eq!(FolderError::NotFound("0:3".into()).to_string(), "Not found: 0:3");
    }
}
