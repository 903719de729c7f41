use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::storage::settings::{Settings, NEW_CHAT, WIDE_MODE};
use crate::theme::ThemeColors;

type KeyEntry = (&'static str, &'static str);

const NAVIGATION_KEYS: &[KeyEntry] = &[
    ("j / ↓", "Move down"),
    ("k / ↑", "Move up"),
    ("g / G", "First / last item"),
    ("Enter / l / →", "Open folder or chat"),
    ("Backspace / h / ←", "Up one folder"),
    ("/", "Search all folders"),
];

const EDIT_KEYS: &[KeyEntry] = &[
    ("Space", "Mark item"),
    ("Ctrl+A", "Mark all"),
    ("Esc", "Clear marks"),
    ("Ctrl+C / Ctrl+X", "Copy / cut"),
    ("Ctrl+V", "Paste into this folder"),
    ("n", "New folder"),
    ("a", "Add chat"),
    ("r", "Rename"),
    ("i / c", "Folder icon / color"),
    ("d / Delete", "Delete"),
    ("x", "Delete chat in the chat app"),
    ("m / M", "Pick up / drop on focused folder"),
];

const VIEW_KEYS: &[KeyEntry] = &[
    ("s / S", "Sort direction / field"),
    ("v", "List or grid"),
    ("?", "This help"),
    ("q", "Quit"),
];

const CATEGORIES: &[(&str, &[KeyEntry])] = &[
    ("Navigation", NAVIGATION_KEYS),
    ("Folders and Chats", EDIT_KEYS),
    ("View", VIEW_KEYS),
];

/// Keybinding reference, including the configurable shortcuts.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
    settings: &'a Settings,
    scroll_offset: usize,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors, settings: &'a Settings, scroll_offset: usize) -> Self {
        Self {
            theme,
            settings,
            scroll_offset,
        }
    }

    fn header(&self, name: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("── {} ", name),
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("─".repeat(30), Style::default().fg(self.theme.dim_fg)),
        ])
    }

    fn entry(&self, key: &str, description: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("  {:<22}", key),
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(description.to_string(), Style::default().fg(self.theme.list_fg)),
        ])
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (name, entries) in CATEGORIES {
            lines.push(self.header(name));
            for (key, description) in entries.iter() {
                lines.push(self.entry(key, description));
            }
            lines.push(Line::from(""));
        }

        lines.push(self.header("Shortcuts"));
        lines.push(self.entry(&self.settings.shortcut_label(WIDE_MODE), "Toggle wide mode"));
        lines.push(self.entry(&self.settings.shortcut_label(NEW_CHAT), "New chat in browser"));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(self.theme.dim_fg),
        )));
        lines
    }

    /// Number of content lines, for scroll bounds.
    pub fn total_lines() -> usize {
        let fixed: usize = CATEGORIES.iter().map(|(_, e)| e.len() + 2).sum();
        fixed + 5
    }
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width / 10 * 7).clamp(20.min(area.width), 72);
        let height = (area.height / 10 * 8).max(3.min(area.height));
        let rect = crate::components::centered_rect(width, height, area);
        Clear.render(rect, buf);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg));
        let inner = block.inner(rect);
        block.render(rect, buf);
        if inner.height == 0 || inner.width < 2 {
            return;
        }

        let lines = self.build_content_lines();
        let visible = inner.height as usize;
        for (i, line) in lines.iter().skip(self.scroll_offset).take(visible).enumerate() {
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width - 2);
        }

        if lines.len() > visible {
            let indicator = Span::styled(
                format!(" {}/{} ", (self.scroll_offset + 1).min(lines.len()), lines.len()),
                Style::default().fg(self.theme.dim_fg),
            );
            let w = indicator.width() as u16;
            let x = rect.x + rect.width.saturating_sub(w + 1);
            buf.set_span(x, rect.bottom() - 1, &indicator, w);
        }
    }
}
