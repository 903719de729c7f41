use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::dialog::DialogWidget;
use crate::components::help::HelpOverlay;
use crate::components::listing::ListingWidget;
use crate::components::search::SearchWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::folders::clipboard::ClipboardOp;

/// `/ Work / Plans` style location of the open directory.
pub fn location_label(crumbs: &[String]) -> String {
    if crumbs.is_empty() {
        "/".to_string()
    } else {
        format!("/ {}", crumbs.join(" / "))
    }
}

fn clipboard_label(app: &App) -> Option<String> {
    let clipboard = &app.session.clipboard;
    if clipboard.is_empty() {
        return None;
    }
    let verb = match clipboard.operation {
        Some(ClipboardOp::Cut) => "cut",
        _ => "copied",
    };
    Some(format!("📋 {} {}", clipboard.len(), verb))
}

fn drag_label(app: &App) -> Option<String> {
    app.drag.as_ref().map(|dragged| format!("✋ {}", dragged.label()))
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    app.clear_expired_status();
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let location = location_label(&app.session.breadcrumb());
    let border = if app.mode == AppMode::Normal {
        app.theme.border_focused_fg
    } else {
        app.theme.border_fg
    };
    let block = Block::default()
        .title(format!(" {} ", location))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().fg(app.theme.list_fg));

    let entries = app.entries();
    let listing = ListingWidget::new(
        &entries,
        app.session.selection(),
        &app.session.clipboard,
        &app.theme,
    )
    .focus(app.focus)
    .view_mode(app.settings.view_mode)
    .wide(app.settings.wide_mode)
    .block(block);
    frame.render_widget(listing, chunks[0]);

    let info = format!(
        "{}  {}",
        app.settings.sort_mode,
        app.settings.view_mode.label()
    );
    let clipboard = clipboard_label(app);
    let drag = drag_label(app);
    let mut status = StatusBarWidget::new(&location, &info, &app.theme);
    if let Some(clip) = clipboard.as_deref() {
        status = status.clipboard_info(clip);
    }
    if let Some(drag) = drag.as_deref() {
        status = status.drag_info(drag);
    }
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, chunks[1]);

    match &app.mode {
        AppMode::Search => {
            let hits = app.session.search(&app.search_state.query);
            let widget = SearchWidget::new(&app.search_state, &hits, app.session.tree(), &app.theme);
            frame.render_widget(widget, area);
        }
        AppMode::Dialog(_) => {
            frame.render_widget(DialogWidget::new(&app.mode, &app.dialog_state, &app.theme), area);
        }
        AppMode::Help => {
            frame.render_widget(HelpOverlay::new(&app.theme, &app.settings, app.help_scroll), area);
        }
        AppMode::Normal => {}
    }
}
