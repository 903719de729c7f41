use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::components::help::HelpOverlay;
use crate::event::{Event, NativeAction};
use crate::folders::node::{FOLDER_COLORS, FOLDER_ICONS};
use crate::folders::search::HitNode;
use crate::folders::selection::SelectionKey;
use crate::folders::session::{DropOutcome, DropPayload, Entry, EntryItem, Opened, Session};
use crate::folders::store::ChatPlacement;
use crate::folders::{Folder, FolderPath, ItemKind, NodeId, NodePath, Tree};
use crate::host::{watch_native, DetachedHost, HostBridge, WatchResult, DEFAULT_HOST_TIMEOUT_SECS};
use crate::storage::settings::Settings;
use crate::storage::{PersistenceGateway, SETTINGS_KEY, TREE_KEY};
use crate::theme::{self, ThemeColors};

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Opens a URL outside the terminal.
pub type Opener = Box<dyn Fn(&str) -> std::io::Result<()> + Send>;

fn open_in_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    NewFolder,
    Rename { id: NodeId },
    /// Local rename of a chat the host could not rename.
    RenameChat { id: NodeId },
    IconPicker { id: NodeId },
    ColorPicker { id: NodeId },
    /// `title | url`, a bare URL, or a JSON drop payload.
    AddChat,
    DeleteConfirm { names: Vec<String> },
    PermanentDelete { id: NodeId, title: String, url: String },
}

/// Something picked up with `m`, waiting to be dropped. Folders are held by
/// identity and only resolved to a path when dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dragged {
    Folder { id: NodeId, name: String },
    Chat { url: String, title: String },
}

impl Dragged {
    pub fn label(&self) -> &str {
        match self {
            Dragged::Folder { name, .. } => name.as_str(),
            Dragged::Chat { title, url } if title.is_empty() => url.as_str(),
            Dragged::Chat { title, .. } => title.as_str(),
        }
    }
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
    Search,
    Help,
}

/// State for a dialog's text input or picker.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
    /// Highlighted entry of an icon or color picker.
    pub choice: usize,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    pub cursor_position: usize,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub session: Session,
    pub settings: Settings,
    pub theme: ThemeColors,
    /// Row of the listing the cursor is on.
    pub focus: usize,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub search_state: SearchState,
    /// Scroll offset of the help overlay.
    pub help_scroll: usize,
    pub status_message: Option<StatusMessage>,
    /// Item picked up with `m`, waiting to be dropped.
    pub drag: Option<Dragged>,
    pub confirm_delete: bool,
    pub should_quit: bool,
    store: Arc<dyn PersistenceGateway>,
    host: Arc<dyn HostBridge>,
    host_timeout: Duration,
    pushes: Option<UnboundedSender<Tree>>,
    events: UnboundedSender<Event>,
    opener: Opener,
}

impl App {
    pub fn new(
        mut session: Session,
        settings: Settings,
        store: Arc<dyn PersistenceGateway>,
        events: UnboundedSender<Event>,
    ) -> Self {
        session.sort = settings.sort_mode;
        Self {
            session,
            settings,
            theme: theme::dark_theme(),
            focus: 0,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            search_state: SearchState::default(),
            help_scroll: 0,
            status_message: None,
            drag: None,
            confirm_delete: true,
            should_quit: false,
            store,
            host: Arc::new(DetachedHost),
            host_timeout: Duration::from_secs(DEFAULT_HOST_TIMEOUT_SECS),
            pushes: None,
            events,
            opener: Box::new(open_in_browser),
        }
    }

    pub fn with_host(mut self, host: Arc<dyn HostBridge>, timeout: Duration) -> Self {
        self.host = host;
        self.host_timeout = timeout;
        self
    }

    /// Queue every successful save for a remote push.
    pub fn with_pushes(mut self, pushes: UnboundedSender<Tree>) -> Self {
        self.pushes = Some(pushes);
        self
    }

    pub fn with_theme(mut self, theme: ThemeColors) -> Self {
        self.theme = theme;
        self
    }

    #[cfg(test)]
    pub fn with_opener(mut self, opener: Opener) -> Self {
        self.opener = opener;
        self
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Status ──────────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been shown for three seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some(status) = &self.status_message {
            if status.created.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }

    // ── Cursor ──────────────────────────────────────────────────────────────

    pub fn entries(&self) -> Vec<Entry<'_>> {
        self.session.listing()
    }

    pub fn focused_key(&self) -> Option<SelectionKey> {
        self.entries().get(self.focus).map(|e| e.key)
    }

    fn clamp_focus(&mut self) {
        let len = self.entries().len();
        if self.focus >= len {
            self.focus = len.saturating_sub(1);
        }
    }

    fn focus_id(&mut self, id: NodeId) {
        let pos = self.entries().iter().position(|e| e.id() == id);
        if let Some(pos) = pos {
            self.focus = pos;
        }
    }

    fn focus_key(&mut self, key: SelectionKey) {
        let pos = self.entries().iter().position(|e| e.key == key);
        if let Some(pos) = pos {
            self.focus = pos;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.entries().len();
        if len > 0 && self.focus < len - 1 {
            self.focus += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.focus = 0;
    }

    pub fn select_last(&mut self) {
        self.focus = self.entries().len().saturating_sub(1);
    }

    // ── Navigation and selection ────────────────────────────────────────────

    /// Open the focused row: enter a folder or open a chat externally.
    pub fn open_focused(&mut self) {
        let Some(key) = self.focused_key() else {
            return;
        };
        self.session.toggle_select(key, false);
        match self.session.open_selected() {
            Some(Opened::Folder(_)) => self.focus = 0,
            Some(Opened::Chat { title, url }) => {
                self.session.clear_selection();
                match (self.opener)(&url) {
                    Ok(()) => self.set_status_message(format!("Opened {}", title)),
                    Err(e) => self.set_error_message(format!("Cannot open {}: {}", url, e)),
                }
            }
            None => {}
        }
    }

    pub fn go_up(&mut self) {
        let left = self.session.current_dir().last();
        if self.session.go_up() {
            self.focus = 0;
            if let Some(index) = left {
                self.focus_key(SelectionKey::folder(index));
            }
        }
    }

    /// Toggle the focused row in the multi-selection and move down.
    pub fn toggle_mark(&mut self) {
        if let Some(key) = self.focused_key() {
            self.session.toggle_select(key, true);
            self.select_next();
        }
    }

    pub fn select_all(&mut self) {
        self.session.select_all();
    }

    pub fn clear_marks(&mut self) {
        self.session.clear_selection();
        self.drag = None;
    }

    /// Act on the focused row when nothing is marked.
    fn ensure_selection(&mut self) {
        if self.session.selection().is_empty() {
            if let Some(key) = self.focused_key() {
                self.session.toggle_select(key, false);
            }
        }
    }

    // ── Clipboard ───────────────────────────────────────────────────────────

    pub fn copy(&mut self) {
        self.ensure_selection();
        let count = self.session.copy_selected();
        if count > 0 {
            self.set_status_message(format!("Copied {} item(s)", count));
        }
    }

    pub fn cut(&mut self) {
        self.ensure_selection();
        let count = self.session.cut_selected();
        if count > 0 {
            self.set_status_message(format!("Cut {} item(s)", count));
        }
    }

    pub async fn paste(&mut self) {
        if self.session.clipboard.is_empty() {
            self.set_status_message("Clipboard is empty");
            return;
        }
        match self.session.paste() {
            Ok(report) => {
                self.clamp_focus();
                let changed = report.pasted > 0 || report.removed_originals > 0;
                self.set_status_message(report.message());
                if changed {
                    self.persist().await;
                }
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    // ── Edits ───────────────────────────────────────────────────────────────

    /// Ask before deleting the marked rows (or the focused one).
    pub async fn request_delete(&mut self) {
        self.ensure_selection();
        let names: Vec<String> = self
            .entries()
            .iter()
            .filter(|e| self.session.selection().contains(&e.key))
            .map(|e| e.name().to_string())
            .collect();
        if names.is_empty() {
            return;
        }
        if self.confirm_delete {
            self.open_dialog(DialogKind::DeleteConfirm { names });
        } else {
            self.delete_confirmed().await;
        }
    }

    pub async fn delete_confirmed(&mut self) {
        let removed = self.session.delete_selected();
        self.clamp_focus();
        if removed > 0 {
            self.set_status_message(format!("Deleted {} item(s)", removed));
            self.persist().await;
        }
    }

    pub async fn create_folder(&mut self, name: &str) {
        match self.session.create_folder(name) {
            Ok(path) => {
                if let Some(index) = path.last() {
                    self.focus_key(SelectionKey::folder(index));
                }
                self.set_status_message("Folder created");
                self.persist().await;
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    /// Rename the focused row. Chats go through the host first.
    pub fn start_rename(&mut self) {
        let Some(entry) = self.entries().get(self.focus).copied() else {
            return;
        };
        match entry.item {
            EntryItem::Folder(folder) => {
                let (id, name) = (folder.id, folder.name.clone());
                self.open_dialog(DialogKind::Rename { id });
                self.prefill(&name);
            }
            EntryItem::Chat(chat) => {
                let (id, url) = (chat.id, chat.url.clone());
                self.set_status_message("Waiting for the chat application to rename...");
                self.spawn_native(NativeAction::Rename, id, url);
            }
        }
    }

    pub async fn rename_confirmed(&mut self, kind: &DialogKind, name: &str) {
        let result = match kind {
            DialogKind::Rename { id } | DialogKind::RenameChat { id } => {
                self.session.rename_by_id(*id, name)
            }
            _ => return,
        };
        match result {
            Ok(true) => {
                self.set_status_message("Renamed");
                self.persist().await;
            }
            Ok(false) => {}
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    fn focused_folder_index(&self) -> Option<usize> {
        self.focused_key()
            .filter(|k| k.kind == ItemKind::Folder)
            .map(|k| k.index)
    }

    fn focused_folder(&self) -> Option<&Folder> {
        match self.entries().get(self.focus)?.item {
            EntryItem::Folder(folder) => Some(folder),
            EntryItem::Chat(_) => None,
        }
    }

    pub fn start_icon_picker(&mut self) {
        let Some(folder) = self.focused_folder() else {
            self.set_status_message("Icons apply to folders only");
            return;
        };
        let id = folder.id;
        let current = FOLDER_ICONS
            .iter()
            .position(|i| *i == folder.icon)
            .unwrap_or(0);
        self.open_dialog(DialogKind::IconPicker { id });
        self.dialog_state.choice = current;
    }

    pub fn start_color_picker(&mut self) {
        let Some(folder) = self.focused_folder() else {
            self.set_status_message("Colors apply to folders only");
            return;
        };
        let id = folder.id;
        let current = folder
            .color
            .as_deref()
            .and_then(|c| FOLDER_COLORS.iter().position(|name| *name == c))
            .unwrap_or(0);
        self.open_dialog(DialogKind::ColorPicker { id });
        self.dialog_state.choice = current;
    }

    pub async fn pick_confirmed(&mut self, kind: &DialogKind, choice: usize) {
        let result = match kind {
            DialogKind::IconPicker { id } => match FOLDER_ICONS.get(choice) {
                Some(icon) => self.session.set_icon(*id, icon),
                None => return,
            },
            DialogKind::ColorPicker { id } => match FOLDER_COLORS.get(choice) {
                Some(color) => self.session.set_color(*id, color),
                None => return,
            },
            _ => return,
        };
        match result {
            Ok(()) => self.persist().await,
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    /// Add a chat to the open folder from `title | url`, a bare URL, or a
    /// JSON drop payload.
    pub async fn add_chat(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        if input.starts_with('{') {
            let cwd = self.session.current_dir().clone();
            match DropPayload::parse(input) {
                Ok(payload) => self.apply_drop(payload, &cwd).await,
                Err(e) => self.set_error_message(e.to_string()),
            }
            return;
        }
        let (title, url) = match input.split_once('|') {
            Some((title, url)) if !title.trim().is_empty() => (title.trim(), url.trim()),
            Some((_, url)) => (url.trim(), url.trim()),
            None => (input, input),
        };
        if url.is_empty() {
            self.set_error_message("A chat needs a URL");
            return;
        }
        match self.session.add_chat(title, url) {
            Ok(placement) => self.report_placement(placement).await,
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    async fn report_placement(&mut self, placement: ChatPlacement) {
        match placement {
            ChatPlacement::Added { folder } => {
                self.set_status_message(format!("Added to {}", folder));
                self.persist().await;
            }
            ChatPlacement::AlreadyPresent { folder } => {
                self.set_status_message(format!("Already in {}", folder));
            }
        }
    }

    // ── Drag and drop ───────────────────────────────────────────────────────

    /// Pick up the focused row for a later drop.
    pub fn pick_up(&mut self) {
        let Some(entry) = self.entries().get(self.focus).copied() else {
            return;
        };
        let dragged = match entry.item {
            EntryItem::Folder(folder) => Dragged::Folder {
                id: folder.id,
                name: folder.name.clone(),
            },
            EntryItem::Chat(chat) => Dragged::Chat {
                url: chat.url.clone(),
                title: chat.title.clone(),
            },
        };
        let message = format!("Picked up {}. Press M on a folder to drop", dragged.label());
        self.drag = Some(dragged);
        self.set_status_message(message);
    }

    /// Drop the picked-up item on the focused folder, or on the open
    /// directory when the cursor is not on a folder.
    pub async fn drop_on_focused(&mut self) {
        let Some(dragged) = self.drag.take() else {
            self.set_status_message("Nothing picked up");
            return;
        };
        let payload = match dragged {
            Dragged::Folder { id, name } => match self.session.tree().locate(id) {
                Some(NodePath::Folder(path)) => DropPayload::Folder { path },
                _ => {
                    self.set_error_message(format!("{} no longer exists", name));
                    return;
                }
            },
            Dragged::Chat { url, title } => DropPayload::Chat { url, title },
        };
        let target = match self.focused_folder_index() {
            Some(index) => self.session.current_dir().child(index),
            None => self.session.current_dir().clone(),
        };
        self.apply_drop(payload, &target).await;
    }

    async fn apply_drop(&mut self, payload: DropPayload, target: &FolderPath) {
        match self.session.apply_drop(payload, target) {
            Ok(DropOutcome::MovedFolder(path)) => {
                debug!("folder now at {}", path);
                self.clamp_focus();
                self.set_status_message("Folder moved");
                self.persist().await;
            }
            Ok(DropOutcome::Chat(placement)) => {
                self.clamp_focus();
                self.report_placement(placement).await;
            }
            Err(e) => {
                self.clamp_focus();
                self.set_error_message(e.to_string());
            }
        }
    }

    // ── Host flows ──────────────────────────────────────────────────────────

    /// Ask before a permanent delete of the focused chat.
    pub fn request_permanent_delete(&mut self) {
        let kind = match self.entries().get(self.focus).map(|e| e.item) {
            Some(EntryItem::Chat(chat)) => Some(DialogKind::PermanentDelete {
                id: chat.id,
                title: chat.title.clone(),
                url: chat.url.clone(),
            }),
            _ => None,
        };
        match kind {
            Some(kind) => self.open_dialog(kind),
            None => self.set_status_message("Permanent delete applies to chats only"),
        }
    }

    pub fn permanent_delete_confirmed(&mut self, id: NodeId, url: String) {
        self.set_status_message("Waiting for the chat application to delete...");
        self.spawn_native(NativeAction::Delete, id, url);
    }

    fn spawn_native(&self, action: NativeAction, id: NodeId, url: String) {
        let host = Arc::clone(&self.host);
        let events = self.events.clone();
        let timeout = self.host_timeout;
        tokio::spawn(async move {
            let result = match action {
                NativeAction::Rename => watch_native(host.trigger_rename(&url), timeout).await,
                NativeAction::Delete => watch_native(host.trigger_delete(&url), timeout).await,
            };
            let _ = events.send(Event::NativeFinished { action, id, result });
        });
    }

    fn chat_title(&self, id: NodeId) -> Option<String> {
        match self.session.tree().locate(id)? {
            NodePath::Chat { folder, index } => {
                self.session.tree().chat(&folder, index).map(|c| c.title.clone())
            }
            NodePath::Folder(_) => None,
        }
    }

    pub async fn handle_native_finished(&mut self, action: NativeAction, id: NodeId, result: WatchResult) {
        info!("host {:?} finished: {:?}", action, result);
        match (action, result) {
            (NativeAction::Rename, WatchResult::Completed { title: Some(title) }) => {
                match self.session.rename_by_id(id, &title) {
                    Ok(true) => {
                        self.set_status_message("Renamed");
                        self.persist().await;
                    }
                    Ok(false) => {}
                    Err(e) => self.set_error_message(e.to_string()),
                }
            }
            (NativeAction::Rename, WatchResult::Completed { title: None }) => {
                self.set_status_message("Renamed in the chat application");
            }
            (NativeAction::Rename, WatchResult::NotFound) => {
                let Some(title) = self.chat_title(id) else {
                    return;
                };
                self.open_dialog(DialogKind::RenameChat { id });
                self.prefill(&title);
                self.set_status_message("Chat not open in the chat application, renaming locally");
            }
            (NativeAction::Delete, WatchResult::Completed { .. }) => {
                match self.session.remove_by_id(id) {
                    Ok(()) => {
                        self.clamp_focus();
                        self.set_status_message("Deleted permanently");
                        self.persist().await;
                    }
                    Err(e) => self.set_error_message(e.to_string()),
                }
            }
            (NativeAction::Delete, WatchResult::NotFound) => {
                self.set_error_message("Chat not found in the chat application, nothing deleted");
            }
            (_, WatchResult::Cancelled) => self.set_status_message("Cancelled"),
            (_, WatchResult::TimedOut) => {
                self.set_status_message("The chat application did not respond");
            }
        }
    }

    // ── Search ──────────────────────────────────────────────────────────────

    pub fn open_search(&mut self) {
        let query = self.session.search_term.clone();
        self.search_state = SearchState {
            cursor_position: query.len(),
            query,
            selected: 0,
        };
        self.mode = AppMode::Search;
    }

    pub fn close_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn update_search(&mut self, query: String) {
        self.session.search_term = query.clone();
        self.search_state.cursor_position = self.search_state.cursor_position.min(query.len());
        self.search_state.query = query;
        self.search_state.selected = 0;
    }

    pub fn search_move(&mut self, down: bool) {
        let count = self.session.search(&self.search_state.query).len();
        if down {
            if self.search_state.selected + 1 < count {
                self.search_state.selected += 1;
            }
        } else {
            self.search_state.selected = self.search_state.selected.saturating_sub(1);
        }
    }

    /// Open the directory of the highlighted hit, focusing a chat hit.
    pub fn search_confirm(&mut self) {
        let target = self
            .session
            .search(&self.search_state.query)
            .get(self.search_state.selected)
            .map(|hit| {
                let chat_id = match hit.node {
                    HitNode::Chat(c) => Some(c.id),
                    HitNode::Folder(_) => None,
                };
                (hit.open_dir(), chat_id)
            });
        let Some((dir, chat_id)) = target else {
            return;
        };
        self.mode = AppMode::Normal;
        match self.session.jump_to(dir) {
            Ok(()) => {
                self.focus = 0;
                if let Some(id) = chat_id {
                    self.focus_id(id);
                }
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    // ── Help ────────────────────────────────────────────────────────────────

    pub fn open_help(&mut self) {
        self.help_scroll = 0;
        self.mode = AppMode::Help;
    }

    pub fn close_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn scroll_help(&mut self, down: bool) {
        if down {
            let max = HelpOverlay::total_lines().saturating_sub(1);
            self.help_scroll = (self.help_scroll + 1).min(max);
        } else {
            self.help_scroll = self.help_scroll.saturating_sub(1);
        }
    }

    // ── Settings ────────────────────────────────────────────────────────────

    pub async fn toggle_sort_direction(&mut self) {
        self.session.sort.toggle_direction();
        self.sort_changed().await;
    }

    pub async fn toggle_sort_field(&mut self) {
        self.session.sort.toggle_field();
        self.sort_changed().await;
    }

    async fn sort_changed(&mut self) {
        self.settings.sort_mode = self.session.sort;
        self.set_status_message(format!("Sort: {}", self.session.sort));
        self.save_settings().await;
    }

    pub async fn toggle_view_mode(&mut self) {
        self.settings.view_mode = self.settings.view_mode.toggle();
        self.save_settings().await;
    }

    pub async fn toggle_wide_mode(&mut self) {
        self.settings.wide_mode = !self.settings.wide_mode;
        let state = if self.settings.wide_mode { "on" } else { "off" };
        self.set_status_message(format!("Wide mode {}", state));
        self.save_settings().await;
    }

    /// Start a fresh conversation in the chat application.
    pub fn new_chat(&mut self) {
        let url = format!("{}/app", self.session.base_url().trim_end_matches('/'));
        if let Err(e) = (self.opener)(&url) {
            self.set_error_message(format!("Cannot open {}: {}", url, e));
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    /// Save the tree, then queue it for the remote. A failed save keeps the
    /// in-memory state and reports the error.
    pub async fn persist(&mut self) {
        let value = self.session.tree().to_value();
        match self.store.save(TREE_KEY, &value).await {
            Ok(()) => {
                if let Some(pushes) = &self.pushes {
                    let _ = pushes.send(self.session.tree().clone());
                }
            }
            Err(e) => {
                warn!("saving folders failed: {}", e);
                self.set_error_message(format!("Save failed: {}", e));
            }
        }
    }

    pub async fn save_settings(&mut self) {
        if let Err(e) = self.store.save(SETTINGS_KEY, &self.settings.to_value()).await {
            warn!("saving settings failed: {}", e);
            self.set_error_message(format!("Saving settings failed: {}", e));
        }
    }

    /// Apply a value another process wrote to the store.
    pub fn handle_store_change(&mut self, key: &str, value: Value) {
        match key {
            TREE_KEY => {
                let tree = Tree::from_value(value);
                if &tree == self.session.tree() {
                    return;
                }
                self.session.replace_tree(tree);
                self.drag = None;
                self.clamp_focus();
                self.set_status_message("Folders updated from another window");
            }
            SETTINGS_KEY => {
                self.settings = Settings::from_value(value);
                self.session.sort = self.settings.sort_mode;
            }
            other => debug!("ignoring change to {}", other),
        }
    }

    pub fn handle_push_finished(&mut self, result: std::result::Result<(), String>) {
        if let Err(e) = result {
            self.set_error_message(format!("Sync failed: {}", e));
        }
    }

    // ── Dialog input ────────────────────────────────────────────────────────

    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        self.mode = AppMode::Dialog(kind);
    }

    fn prefill(&mut self, text: &str) {
        self.dialog_state.input = text.to_string();
        self.dialog_state.cursor_position = text.len();
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    /// Move a picker highlight, wrapping within `len` entries.
    pub fn picker_move(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let next = (self.dialog_state.choice as isize + delta).rem_euclid(len as isize);
        self.dialog_state.choice = next as usize;
    }
}
