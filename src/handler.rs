use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, AppMode, DialogKind};
use crate::components::dialog::PICKER_COLUMNS;
use crate::folders::node::{FOLDER_COLORS, FOLDER_ICONS};
use crate::storage::settings::{NEW_CHAT, WIDE_MODE};

/// Handle a key event in the current mode.
pub async fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key).await,
        AppMode::Search => handle_search_mode(app, key),
        AppMode::Help => handle_help_mode(app, key),
        AppMode::Dialog(kind) => handle_dialog_mode(app, kind, key).await,
    }
}

fn shortcut_pressed(app: &App, action: &str, key: &KeyEvent) -> bool {
    app.settings
        .shortcut(action)
        .is_some_and(|shortcut| shortcut.matches(key))
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if shortcut_pressed(app, WIDE_MODE, &key) {
        app.toggle_wide_mode().await;
        return;
    }
    if shortcut_pressed(app, NEW_CHAT, &key) {
        app.new_chat();
        return;
    }
    // Other Alt chords belong to the chat page.
    if key.modifiers.contains(KeyModifiers::ALT) {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.copy(),
            KeyCode::Char('x') => app.cut(),
            KeyCode::Char('v') => app.paste().await,
            KeyCode::Char('a') => app.select_all(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.open_focused(),
        KeyCode::Char('h') | KeyCode::Backspace | KeyCode::Left => app.go_up(),
        KeyCode::Char(' ') => app.toggle_mark(),
        KeyCode::Esc => app.clear_marks(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete().await,
        KeyCode::Char('n') => app.open_dialog(DialogKind::NewFolder),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('i') => app.start_icon_picker(),
        KeyCode::Char('c') => app.start_color_picker(),
        KeyCode::Char('a') => app.open_dialog(DialogKind::AddChat),
        KeyCode::Char('m') => app.pick_up(),
        KeyCode::Char('M') => app.drop_on_focused().await,
        KeyCode::Char('/') => app.open_search(),
        KeyCode::Char('s') => app.toggle_sort_direction().await,
        KeyCode::Char('S') => app.toggle_sort_field().await,
        KeyCode::Char('v') => app.toggle_view_mode().await,
        KeyCode::Char('x') => app.request_permanent_delete(),
        KeyCode::Char('?') => app.open_help(),
        _ => {}
    }
}

fn handle_help_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => app.close_help(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_help(true),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_help(false),
        _ => {}
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) {
    let pos = app.search_state.cursor_position;
    match key.code {
        KeyCode::Esc => app.close_search(),
        KeyCode::Enter => app.search_confirm(),
        KeyCode::Down => app.search_move(true),
        KeyCode::Up => app.search_move(false),
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_move(true)
        }
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_move(false)
        }
        KeyCode::Left => {
            if let Some(prev) = app.search_state.query[..pos].chars().next_back() {
                app.search_state.cursor_position -= prev.len_utf8();
            }
        }
        KeyCode::Right => {
            if let Some(next) = app.search_state.query[pos..].chars().next() {
                app.search_state.cursor_position += next.len_utf8();
            }
        }
        KeyCode::Backspace => {
            let mut query = app.search_state.query.clone();
            if let Some(prev) = query[..pos].chars().next_back() {
                let at = pos - prev.len_utf8();
                query.remove(at);
                app.search_state.cursor_position = at;
                app.update_search(query);
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut query = app.search_state.query.clone();
            query.insert(pos, c);
            app.search_state.cursor_position = pos + c.len_utf8();
            app.update_search(query);
        }
        _ => {}
    }
}

async fn handle_dialog_mode(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match kind {
        DialogKind::IconPicker { .. } => handle_picker(app, kind, FOLDER_ICONS.len(), key).await,
        DialogKind::ColorPicker { .. } => handle_picker(app, kind, FOLDER_COLORS.len(), key).await,
        DialogKind::DeleteConfirm { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.close_dialog();
                app.delete_confirmed().await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::PermanentDelete { id, url, .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.close_dialog();
                app.permanent_delete_confirmed(id, url);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::NewFolder
        | DialogKind::Rename { .. }
        | DialogKind::RenameChat { .. }
        | DialogKind::AddChat => handle_text_input(app, kind, key).await,
    }
}

async fn handle_picker(app: &mut App, kind: DialogKind, len: usize, key: KeyEvent) {
    let columns = PICKER_COLUMNS as isize;
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.picker_move(-1, len),
        KeyCode::Right | KeyCode::Char('l') => app.picker_move(1, len),
        KeyCode::Up | KeyCode::Char('k') => app.picker_move(-columns, len),
        KeyCode::Down | KeyCode::Char('j') => app.picker_move(columns, len),
        KeyCode::Enter => {
            let choice = app.dialog_state.choice;
            app.close_dialog();
            app.pick_confirmed(&kind, choice).await;
        }
        KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

async fn handle_text_input(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.dialog_state.input);
            app.close_dialog();
            match kind {
                DialogKind::NewFolder => app.create_folder(&input).await,
                DialogKind::AddChat => app.add_chat(&input).await,
                _ => app.rename_confirmed(&kind, &input).await,
            }
        }
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dialog_input_char(c)
        }
        _ => {}
    }
}
