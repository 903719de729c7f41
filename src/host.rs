//! Best-effort pass-through of rename/delete to the chat application that
//! owns the conversations. The local tree is the fallback whenever the host
//! cannot act.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

/// Default time to wait for a host flow to finish.
pub const DEFAULT_HOST_TIMEOUT_SECS: u64 = 10;

/// How a host flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeOutcome {
    /// The user finished the flow. Carries the host's title for renames.
    Completed { title: Option<String> },
    /// The user dismissed the flow.
    Cancelled,
    /// The host has no element for this chat.
    NotFound,
}

/// A watched host flow, including abandonment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchResult {
    Completed { title: Option<String> },
    Cancelled,
    NotFound,
    TimedOut,
}

impl From<NativeOutcome> for WatchResult {
    fn from(outcome: NativeOutcome) -> Self {
        match outcome {
            NativeOutcome::Completed { title } => WatchResult::Completed { title },
            NativeOutcome::Cancelled => WatchResult::Cancelled,
            NativeOutcome::NotFound => WatchResult::NotFound,
        }
    }
}

/// Capability to drive the host application's own rename/delete flows.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Whether the host currently shows an element for the chat.
    async fn find_chat(&self, url: &str) -> bool;

    async fn trigger_rename(&self, url: &str) -> NativeOutcome;

    async fn trigger_delete(&self, url: &str) -> NativeOutcome;
}

/// Wait for a host flow, giving up after `timeout`.
///
/// Abandoning the wait does not undo anything already applied locally.
pub async fn watch_native<F>(flow: F, timeout: Duration) -> WatchResult
where
    F: Future<Output = NativeOutcome>,
{
    match tokio::time::timeout(timeout, flow).await {
        Ok(outcome) => {
            debug!("host flow ended: {:?}", outcome);
            outcome.into()
        }
        Err(_) => {
            info!("host flow abandoned after {:?}", timeout);
            WatchResult::TimedOut
        }
    }
}

/// Host for a standalone terminal: no host application is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

#[async_trait]
impl HostBridge for DetachedHost {
    async fn find_chat(&self, _url: &str) -> bool {
        false
    }

    async fn trigger_rename(&self, _url: &str) -> NativeOutcome {
        NativeOutcome::NotFound
    }

    async fn trigger_delete(&self, _url: &str) -> NativeOutcome {
        NativeOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedHost {
        delay: Duration,
        outcome: NativeOutcome,
    }

    #[async_trait]
    impl HostBridge for ScriptedHost {
        async fn find_chat(&self, _url: &str) -> bool {
            true
        }

        async fn trigger_rename(&self, _url: &str) -> NativeOutcome {
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        }

        async fn trigger_delete(&self, url: &str) -> NativeOutcome {
            self.trigger_rename(url).await
        }
    }

    #[tokio::test]
    async fn detached_host_finds_nothing() {
        let host = DetachedHost;
        assert!(!host.find_chat("https://x/1").await);
        assert_eq!(
            watch_native(host.trigger_delete("https://x/1"), Duration::from_secs(1)).await,
            WatchResult::NotFound
        );
    }

    #[tokio::test]
    async fn completed_flow_carries_title() {
        let host = ScriptedHost {
            delay: Duration::from_millis(5),
            outcome: NativeOutcome::Completed {
                title: Some("New".into()),
            },
        };
        assert_eq!(
            watch_native(host.trigger_rename("u"), Duration::from_secs(1)).await,
            WatchResult::Completed {
                title: Some("New".into())
            }
        );
    }

    #[tokio::test]
    async fn slow_flow_times_out() {
        let host = ScriptedHost {
            delay: Duration::from_secs(DEFAULT_HOST_TIMEOUT_SECS),
            outcome: NativeOutcome::Cancelled,
        };
        assert_eq!(
            watch_native(host.trigger_delete("u"), Duration::from_millis(20)).await,
            WatchResult::TimedOut
        );
    }

    #[test]
    fn outcome_maps_to_watch_result() {
        assert_eq!(WatchResult::from(NativeOutcome::Cancelled), WatchResult::Cancelled);
    }
}
