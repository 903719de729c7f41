mod app;
mod components;
mod config;
mod error;
mod event;
mod folders;
mod handler;
mod host;
mod storage;
mod sync;
mod theme;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::folders::session::Session;
use crate::folders::Tree;
use crate::host::DetachedHost;
use crate::storage::json_store::JsonFileStore;
use crate::storage::settings::Settings;
use crate::storage::{PersistenceGateway, SESSION_KEY, SETTINGS_KEY, TREE_KEY};
use crate::sync::rest::RestSyncClient;
use crate::sync::{RemoteSession, RemoteSyncGateway, SyncOutcome};
use crate::tui::{install_panic_hook, Tui};

/// Organize chat links into nested folders from the terminal.
#[derive(Parser, Debug)]
#[command(name = "chatfm", version, about)]
struct Cli {
    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the folder data
    #[arg(long)]
    store_dir: Option<String>,

    /// Do not reload when another process changes the data
    #[arg(long)]
    no_watcher: bool,

    /// Do not sync with the remote backend
    #[arg(long)]
    no_sync: bool,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        let mut overrides = AppConfig::default();
        overrides.general.store_dir = self.store_dir.clone();
        if self.no_watcher {
            overrides.watcher.enabled = Some(false);
        }
        if self.no_sync {
            overrides.sync.enabled = Some(false);
        }
        overrides
    }
}

/// Send logs to an append-mode file; `RUST_LOG` overrides the configured level.
fn init_logging(path: &Path, level: &str) -> error::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::Config(format!("bad log level {:?}: {}", level, e)))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Reconcile with the remote and start the background pusher. Returns the
/// tree to start from and the push queue, or the local tree alone when sync
/// is off or fails.
async fn start_sync(
    config: &AppConfig,
    store: &dyn PersistenceGateway,
    tree: Tree,
    events: UnboundedSender<Event>,
) -> (Tree, Option<UnboundedSender<Tree>>, Option<String>) {
    let Some((url, api_key)) = config.sync_endpoint() else {
        return (tree, None, None);
    };
    let session = match store.load(SESSION_KEY).await {
        Ok(Some(value)) => RemoteSession::from_value(value),
        Ok(None) => None,
        Err(e) => {
            warn!("reading session failed: {}", e);
            None
        }
    };
    let Some(session) = session else {
        info!("no signed-in session, sync disabled");
        return (tree, None, None);
    };
    let Some(user_id) = session.user_id().map(str::to_string) else {
        return (tree, None, None);
    };

    let client: Arc<dyn RemoteSyncGateway> =
        Arc::new(RestSyncClient::new(url, api_key).with_token(&session.access_token));

    let (tree, message) = match sync::reconcile(client.as_ref(), &user_id, &tree).await {
        Ok(outcome) => {
            let message = outcome.message().to_string();
            match outcome {
                SyncOutcome::Pulled(remote) => {
                    if let Err(e) = store.save(TREE_KEY, &remote.to_value()).await {
                        warn!("saving pulled tree failed: {}", e);
                    }
                    (remote, message)
                }
                SyncOutcome::Pushed | SyncOutcome::NothingToSync => (tree, message),
            }
        }
        Err(e) => {
            warn!("initial sync failed: {}", e);
            (tree, format!("Sync failed: {}", e))
        }
    };

    let pushes = sync::spawn_push_worker(client, user_id, move |result| {
        let _ = events.send(Event::PushFinished(result.map_err(|e| e.to_string())));
    });
    (tree, Some(pushes), Some(message))
}

fn forward_changes(store: &dyn PersistenceGateway, key: &'static str, events: UnboundedSender<Event>) {
    let callback = Box::new(move |value: Value| {
        let _ = events.send(Event::StoreChanged {
            key: key.to_string(),
            value,
        });
    });
    if let Err(e) = store.on_external_change(key, callback) {
        warn!("cannot watch {}: {}", key, e);
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let store_dir = config.store_dir();
    std::fs::create_dir_all(&store_dir).map_err(|e| {
        AppError::InvalidPath(format!("{}: {}", store_dir.display(), e))
    })?;
    init_logging(&config.log_file(), config.log_level())?;
    info!("starting with store {}", store_dir.display());

    let mut store = JsonFileStore::new(store_dir.clone());
    if config.watcher_enabled() {
        store = store.with_watcher(Duration::from_millis(config.debounce_ms()));
    }
    let store: Arc<dyn PersistenceGateway> = Arc::new(store);

    let tree = store
        .load(TREE_KEY)
        .await?
        .map(Tree::from_value)
        .unwrap_or_default();
    let settings = store
        .load(SETTINGS_KEY)
        .await?
        .map(Settings::from_value)
        .unwrap_or_default();

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let event_tx = events.sender();

    let (tree, pushes, sync_message) =
        start_sync(&config, store.as_ref(), tree, event_tx.clone()).await;
    info!("loaded {} folders and chats", tree.node_count());

    forward_changes(store.as_ref(), TREE_KEY, event_tx.clone());
    forward_changes(store.as_ref(), SETTINGS_KEY, event_tx.clone());

    let session = Session::new(tree, config.base_url());
    let mut app = App::new(session, settings, store, event_tx)
        .with_host(Arc::new(DetachedHost), config.host_timeout())
        .with_theme(theme::resolve_theme(&config.theme));
    app.confirm_delete = config.confirm_delete();
    if let Some(pushes) = pushes {
        app = app.with_pushes(pushes);
    }
    if let Some(message) = sync_message {
        app.set_status_message(message);
    }

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key).await,
            Event::StoreChanged { key, value } => app.handle_store_change(&key, value),
            Event::PushFinished(result) => app.handle_push_finished(result),
            Event::NativeFinished { action, id, result } => {
                app.handle_native_finished(action, id, result).await
            }
            Event::Tick => {}
            Event::Resize(_, _) => {}
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    info!("exiting");
    Ok(())
}
