use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::folders::clipboard::ClipboardState;
use crate::folders::selection::Selection;
use crate::folders::session::{Entry, EntryItem};
use crate::storage::settings::ViewMode;
use crate::theme::ThemeColors;

/// Icon shown in front of chats.
pub const CHAT_ICON: &str = "💬";

/// Width of one grid tile, including the gap.
pub const TILE_WIDTH: u16 = 26;

/// Renders the open directory as a list or a grid of tiles.
pub struct ListingWidget<'a> {
    entries: &'a [Entry<'a>],
    selection: &'a Selection,
    clipboard: &'a ClipboardState,
    focus: usize,
    theme: &'a ThemeColors,
    view_mode: ViewMode,
    wide: bool,
    block: Option<Block<'a>>,
}

impl<'a> ListingWidget<'a> {
    pub fn new(
        entries: &'a [Entry<'a>],
        selection: &'a Selection,
        clipboard: &'a ClipboardState,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            entries,
            selection,
            clipboard,
            focus: 0,
            theme,
            view_mode: ViewMode::default(),
            wide: false,
            block: None,
        }
    }

    pub fn focus(mut self, focus: usize) -> Self {
        self.focus = focus;
        self
    }

    pub fn view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    /// Show chat URLs next to their titles.
    pub fn wide(mut self, wide: bool) -> Self {
        self.wide = wide;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn entry_style(&self, index: usize, entry: &Entry<'_>) -> Style {
        let base = match entry.item {
            EntryItem::Folder(folder) => Style::default()
                .fg(self.theme.folder_color(folder.color.as_deref()))
                .add_modifier(Modifier::BOLD),
            EntryItem::Chat(_) => Style::default().fg(self.theme.chat_fg),
        };
        let base = if self.clipboard.is_cut(entry.id()) {
            base.fg(self.theme.cut_fg).add_modifier(Modifier::DIM)
        } else {
            base
        };
        if index == self.focus {
            base.bg(self.theme.list_focus_bg)
        } else if self.selection.contains(&entry.key) {
            base.bg(self.theme.list_selected_bg)
        } else {
            base
        }
    }

    fn label(entry: &Entry<'_>) -> String {
        match entry.item {
            EntryItem::Folder(folder) => {
                let count = folder.chats.len() + folder.folders.len();
                format!("{} {} ({})", folder.icon, folder.name, count)
            }
            EntryItem::Chat(chat) => format!("{} {}", CHAT_ICON, chat.title),
        }
    }

    fn line_for(&self, index: usize, entry: &Entry<'_>) -> Line<'static> {
        let style = self.entry_style(index, entry);
        let marker = if self.selection.contains(&entry.key) {
            "● "
        } else {
            "  "
        };
        let mut spans = vec![
            Span::styled(marker, Style::default().fg(self.theme.accent_fg)),
            Span::styled(Self::label(entry), style),
        ];
        if let (true, EntryItem::Chat(chat)) = (self.wide, entry.item) {
            spans.push(Span::styled(
                format!("  {}", chat.url),
                Style::default().fg(self.theme.dim_fg),
            ));
        }
        Line::from(spans)
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let height = area.height as usize;
        let scroll = self
            .focus
            .saturating_sub(height.saturating_sub(1))
            .min(self.entries.len().saturating_sub(height));
        for (row, (index, entry)) in self
            .entries
            .iter()
            .enumerate()
            .skip(scroll)
            .take(height)
            .enumerate()
        {
            let line = self.line_for(index, entry);
            buf.set_line(area.x, area.y + row as u16, &line, area.width);
        }
    }

    fn render_grid(&self, area: Rect, buf: &mut Buffer) {
        let columns = (area.width / TILE_WIDTH).max(1) as usize;
        let rows = area.height as usize;
        let focus_row = self.focus / columns;
        let total_rows = self.entries.len().div_ceil(columns);
        let scroll = focus_row
            .saturating_sub(rows.saturating_sub(1))
            .min(total_rows.saturating_sub(rows));
        for (index, entry) in self.entries.iter().enumerate().skip(scroll * columns) {
            let row = index / columns - scroll;
            if row >= rows {
                break;
            }
            let col = (index % columns) as u16;
            let x = area.x + col * TILE_WIDTH;
            let width = TILE_WIDTH.saturating_sub(1).min(area.right().saturating_sub(x));
            let line = self.line_for(index, entry);
            buf.set_line(x, area.y + row as u16, &line, width);
        }
    }
}

impl Widget for ListingWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.entries.is_empty() {
            let hint = Line::from(Span::styled(
                "Empty. Press n to create a folder or a to add a chat",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, inner.y, &hint, inner.width);
            return;
        }

        match self.view_mode {
            ViewMode::List => self.render_list(inner, buf),
            ViewMode::Grid => self.render_grid(inner, buf),
        }
    }
}
