//! Optional mirroring of the folder tree to a remote backend, keyed by the
//! signed-in user's id.

pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::folders::Tree;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Signed-in session as stored under the session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<RemoteUser>,
}

impl RemoteSession {
    /// Parse a stored session. Anything without a token is no session.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value::<RemoteSession>(value)
            .ok()
            .filter(|s| !s.access_token.is_empty())
    }

    /// Id to sync under; `None` disables sync.
    pub fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Remote copy of a user's tree.
#[async_trait]
pub trait RemoteSyncGateway: Send + Sync {
    /// The stored tree, or an empty tree when the user has none.
    async fn fetch_remote_tree(&self, user_id: &str) -> Result<Tree>;

    /// Replace the stored tree.
    async fn push_tree(&self, user_id: &str, tree: &Tree) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The remote tree was non-empty and replaces the local one.
    Pulled(Tree),
    /// The remote was empty and the local tree was uploaded.
    Pushed,
    /// Both sides are empty.
    NothingToSync,
}

impl SyncOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SyncOutcome::Pulled(_) => "Synced from cloud",
            SyncOutcome::Pushed => "Synced to cloud",
            SyncOutcome::NothingToSync => "Sync complete (no data)",
        }
    }
}

/// Startup reconciliation: a non-empty remote wins outright; otherwise a
/// non-empty local tree is uploaded.
pub async fn reconcile(
    remote: &dyn RemoteSyncGateway,
    user_id: &str,
    local: &Tree,
) -> Result<SyncOutcome> {
    let remote_tree = remote.fetch_remote_tree(user_id).await?;
    let outcome = if !remote_tree.is_empty() {
        SyncOutcome::Pulled(remote_tree)
    } else if !local.is_empty() {
        remote.push_tree(user_id, local).await?;
        SyncOutcome::Pushed
    } else {
        SyncOutcome::NothingToSync
    };
    info!("reconciled with remote: {}", outcome.message());
    Ok(outcome)
}

/// Spawn a task that pushes queued tree snapshots one at a time. When
/// several snapshots queue up behind a slow push only the newest is sent.
/// The task ends once every sender is dropped.
pub fn spawn_push_worker<F>(
    gateway: Arc<dyn RemoteSyncGateway>,
    user_id: String,
    on_done: F,
) -> mpsc::UnboundedSender<Tree>
where
    F: Fn(Result<()>) + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Tree>();
    tokio::spawn(async move {
        while let Some(mut tree) = rx.recv().await {
            while let Ok(newer) = rx.try_recv() {
                tree = newer;
            }
            let result = gateway.push_tree(&user_id, &tree).await;
            match &result {
                Ok(()) => debug!("pushed tree for {}", user_id),
                Err(e) => warn!("push failed: {}", e),
            }
            on_done(result);
        }
    });
    tx
}
