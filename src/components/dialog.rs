use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::components::centered_rect;
use crate::folders::node::{FOLDER_COLORS, FOLDER_ICONS};
use crate::theme::ThemeColors;

/// Entries per row in the icon and color pickers.
pub const PICKER_COLUMNS: usize = 10;

/// Cells per icon picker entry; emoji are two cells wide.
const ICON_CELL: u16 = 4;
const COLOR_CELL: u16 = 9;

/// Centered modal overlay for the current dialog.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    fn frame(&self, title: &str, width: u16, height: u16, danger: bool, area: Rect, buf: &mut Buffer) -> Rect {
        let rect = centered_rect(width, height, area);
        Clear.render(rect, buf);
        let border = if danger {
            self.theme.error_fg
        } else {
            self.theme.dialog_border_fg
        };
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let line = Line::from(Span::styled(
                text,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
            buf.set_line(inner.x, inner.bottom() - 1, &line, inner.width);
        }
    }

    fn render_input(&self, title: &str, prompt: Option<&str>, area: Rect, buf: &mut Buffer) {
        let width = 60.min(area.width.saturating_sub(4));
        let height = if prompt.is_some() { 6 } else { 5 };
        let inner = self.frame(title, width, height, false, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let mut y = inner.y;
        if let Some(prompt) = prompt {
            let line = Line::from(Span::styled(prompt, Style::default().fg(self.theme.dim_fg)));
            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }

        let input = &self.dialog_state.input;
        let pos = self.dialog_state.cursor_position.min(input.len());
        let (before, rest) = input.split_at(pos);
        let mut rest_chars = rest.chars();
        let cursor = rest_chars.next().map(String::from).unwrap_or_else(|| " ".into());
        let after: String = rest_chars.collect();

        // Keep the cursor visible by dropping leading characters.
        let max_before = (inner.width as usize).saturating_sub(2);
        let before_chars = before.chars().count();
        let before: String = before
            .chars()
            .skip(before_chars.saturating_sub(max_before))
            .collect();

        let input_style = Style::default().fg(self.theme.list_fg);
        let cursor_style = Style::default()
            .bg(self.theme.list_fg)
            .fg(self.theme.dialog_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before, input_style),
            Span::styled(cursor, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, y + 1, &line, inner.width);
        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_confirm(&self, title: &str, header: &str, names: &[String], area: Rect, buf: &mut Buffer) {
        let longest = names.iter().map(|n| n.chars().count()).max().unwrap_or(10);
        let width = (longest as u16 + 10)
            .max(header.len() as u16 + 4)
            .max(40)
            .min(area.width.saturating_sub(4));
        let height = (names.len() as u16 + 5).min(area.height.saturating_sub(2));
        let inner = self.frame(title, width, height, true, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let header = Line::from(Span::styled(
            header,
            Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        let max_items = inner.height.saturating_sub(3) as usize;
        for (i, name) in names.iter().take(max_items).enumerate() {
            let line = Line::from(Span::styled(
                format!("  • {}", name),
                Style::default().fg(self.theme.list_fg),
            ));
            buf.set_line(inner.x, inner.y + 2 + i as u16, &line, inner.width);
        }
        self.hint("[y] Yes  [n/Esc] Cancel", inner, buf);
    }

    fn render_picker(&self, title: &str, labels: &[Span<'static>], cell: u16, area: Rect, buf: &mut Buffer) {
        let rows = labels.len().div_ceil(PICKER_COLUMNS) as u16;
        let width = (cell * PICKER_COLUMNS as u16 + 4).min(area.width.saturating_sub(2));
        let height = (rows + 4).min(area.height);
        let inner = self.frame(title, width, height, false, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        for (i, label) in labels.iter().enumerate() {
            let row = (i / PICKER_COLUMNS) as u16;
            let col = (i % PICKER_COLUMNS) as u16;
            let y = inner.y + row;
            if y >= inner.bottom().saturating_sub(1) {
                break;
            }
            let mut span = label.clone();
            if i == self.dialog_state.choice {
                span = span.patch_style(
                    Style::default()
                        .bg(self.theme.list_selected_bg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            let x = inner.x + col * cell;
            if x < inner.right() {
                buf.set_line(x, y, &Line::from(span), cell.min(inner.right() - x));
            }
        }
        self.hint("[←↑↓→] Move  [Enter] Pick  [Esc] Cancel", inner, buf);
    }
}

impl Widget for DialogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::NewFolder => self.render_input("New Folder", None, area, buf),
            DialogKind::Rename { .. } => self.render_input("Rename", None, area, buf),
            DialogKind::RenameChat { .. } => self.render_input(
                "Rename Chat",
                Some("Renaming here only"),
                area,
                buf,
            ),
            DialogKind::AddChat => self.render_input(
                "Add Chat",
                Some("title | url, a url, or a drop payload"),
                area,
                buf,
            ),
            DialogKind::DeleteConfirm { names } => {
                self.render_confirm("Delete", "Delete the following?", names, area, buf)
            }
            DialogKind::PermanentDelete { title, .. } => self.render_confirm(
                "Delete Permanently",
                "Delete this chat in the chat application?",
                std::slice::from_ref(title),
                area,
                buf,
            ),
            DialogKind::IconPicker { .. } => {
                let labels: Vec<Span<'static>> = FOLDER_ICONS
                    .iter()
                    .map(|icon| Span::raw(format!(" {} ", icon)))
                    .collect();
                self.render_picker("Folder Icon", &labels, ICON_CELL, area, buf);
            }
            DialogKind::ColorPicker { .. } => {
                let labels: Vec<Span<'static>> = FOLDER_COLORS
                    .iter()
                    .map(|name| {
                        let tag = (*name != "default").then_some(*name);
                        Span::styled(
                            format!("■ {}", name),
                            Style::default().fg(self.theme.folder_color(tag)),
                        )
                    })
                    .collect();
                self.render_picker("Folder Color", &labels, COLOR_CELL, area, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_to_string;
    use crate::folders::NodeId;
    use crate::theme::dark_theme;

    fn render(mode: AppMode, state: DialogState) -> String {
        let theme = dark_theme();
        let area = Rect::new(0, 0, 120, 30);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &state, &theme).render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn input_dialog_renders_title_and_text() {
        let state = DialogState {
            input: "Recipes".into(),
            cursor_position: 7,
            choice: 0,
        };
        let content = render(AppMode::Dialog(DialogKind::NewFolder), state);
        assert!(content.contains("New Folder"));
        assert!(content.contains("Recipes"));
    }

    #[test]
    fn rename_and_add_chat_prompts() {
        let content = render(
            AppMode::Dialog(DialogKind::Rename { id: NodeId::fresh() }),
            DialogState::default(),
        );
        assert!(content.contains("Rename"));

        let content = render(AppMode::Dialog(DialogKind::AddChat), DialogState::default());
        assert!(content.contains("title | url"));
    }

    #[test]
    fn confirm_dialogs_list_names() {
        let content = render(
            AppMode::Dialog(DialogKind::DeleteConfirm {
                names: vec!["Work".into(), "standup".into()],
            }),
            DialogState::default(),
        );
        assert!(content.contains("Delete the following?"));
        assert!(content.contains("• Work"));
        assert!(content.contains("• standup"));

        let content = render(
            AppMode::Dialog(DialogKind::PermanentDelete {
                id: NodeId::fresh(),
                title: "retro".into(),
                url: "https://x/app/2".into(),
            }),
            DialogState::default(),
        );
        assert!(content.contains("Delete Permanently"));
        assert!(content.contains("retro"));
    }

    #[test]
    fn color_picker_shows_palette() {
        let content = render(
            AppMode::Dialog(DialogKind::ColorPicker { id: NodeId::fresh() }),
            DialogState::default(),
        );
        for name in ["default", "purple", "grey"] {
            assert!(content.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn icon_picker_renders_without_panic_in_small_area() {
        let theme = dark_theme();
        let mode = AppMode::Dialog(DialogKind::IconPicker { id: NodeId::fresh() });
        let state = DialogState::default();
        let area = Rect::new(0, 0, 12, 4);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &state, &theme).render(area, &mut buf);
    }

    #[test]
    fn normal_mode_draws_nothing() {
        let content = render(AppMode::Normal, DialogState::default());
        assert!(content.trim().is_empty());
    }
}
