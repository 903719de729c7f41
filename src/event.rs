use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::folders::NodeId;
use crate::host::WatchResult;

use crate::error::Result;

/// Host flow an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAction {
    Rename,
    Delete,
}

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// Another process rewrote a stored key.
    StoreChanged { key: String, value: Value },
    /// A background push to the remote finished.
    PushFinished(std::result::Result<(), String>),
    /// A host rename/delete flow ended or was abandoned.
    NativeFinished {
        action: NativeAction,
        id: NodeId,
        result: WatchResult,
    },
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(key)) => event_tx.send(Event::Key(key)),
                        Ok(CrosstermEvent::Resize(w, h)) => event_tx.send(Event::Resize(w, h)),
                        _ => Ok(()),
                    };
                    if forwarded.is_err() {
                        break;
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for store callbacks and background tasks.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
