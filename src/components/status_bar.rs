use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " n:new  r:ren  d:del  /:find  q:quit ";

/// Last `max` characters of `text`, prefixed with an ellipsis when cut.
fn truncate_left(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 1 {
        return text.chars().skip(len - max).collect();
    }
    let tail: String = text.chars().skip(len - (max - 1)).collect();
    format!("…{}", tail)
}

fn truncate_right(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Bottom bar: location, sort mode, clipboard and drag state, key hints,
/// or a transient status message in their place.
pub struct StatusBarWidget<'a> {
    location: &'a str,
    info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    clipboard_info: Option<&'a str>,
    drag_info: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(location: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            location,
            info,
            theme,
            status_message: None,
            is_error: false,
            clipboard_info: None,
            drag_info: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn clipboard_info(mut self, info: &'a str) -> Self {
        self.clipboard_info = Some(info);
        self
    }

    /// Label of the item picked up for a drop.
    pub fn drag_info(mut self, info: &'a str) -> Self {
        self.drag_info = Some(info);
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;
        let bar_style = Style::default().bg(self.theme.status_bg);
        buf.set_style(area, bar_style);

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                bar_style.fg(self.theme.success_fg)
            };
            let text = truncate_right(msg, width);
            let display = format!("{:<width$}", text, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let hints_len = KEY_HINTS.chars().count();
        let mut extras: Vec<Span> = Vec::new();
        if let Some(clip) = self.clipboard_info {
            extras.push(Span::raw(" "));
            extras.push(Span::styled(
                clip.to_string(),
                bar_style.fg(self.theme.accent_fg).add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(drag) = self.drag_info {
            extras.push(Span::raw(" "));
            extras.push(Span::styled(
                drag.to_string(),
                bar_style.fg(self.theme.warning_fg).add_modifier(Modifier::BOLD),
            ));
        }
        let extras_len: usize = extras.iter().map(|s| s.content.chars().count()).sum();

        let remaining = width.saturating_sub(hints_len + extras_len);
        let info = truncate_right(self.info, remaining);
        let info_len = info.chars().count();
        let location = truncate_left(self.location, remaining.saturating_sub(info_len + 1));
        let location_len = location.chars().count();
        let gap = remaining.saturating_sub(location_len + info_len);

        let mut spans = vec![
            Span::styled(location, bar_style.fg(self.theme.status_fg)),
            Span::styled(" ".repeat(gap), bar_style),
            Span::styled(info, bar_style.fg(self.theme.info_fg)),
        ];
        spans.extend(extras);
        if width >= hints_len {
            spans.push(Span::styled(
                KEY_HINTS,
                bar_style.fg(self.theme.dim_fg).add_modifier(Modifier::DIM),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
