use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::SearchState;
use crate::components::centered_rect;
use crate::components::listing::CHAT_ICON;
use crate::folders::search::{HitNode, SearchHit};
use crate::folders::Tree;
use crate::theme::ThemeColors;

/// Search overlay listing every folder and chat that matches the query.
pub struct SearchWidget<'a> {
    state: &'a SearchState,
    hits: &'a [SearchHit<'a>],
    tree: &'a Tree,
    theme: &'a ThemeColors,
}

impl<'a> SearchWidget<'a> {
    pub fn new(
        state: &'a SearchState,
        hits: &'a [SearchHit<'a>],
        tree: &'a Tree,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            state,
            hits,
            tree,
            theme,
        }
    }

    fn location(&self, hit: &SearchHit<'_>) -> String {
        let crumbs = self.tree.breadcrumb(&hit.path.container());
        if crumbs.is_empty() {
            "/".to_string()
        } else {
            format!("/ {}", crumbs.join(" / "))
        }
    }

    fn hit_line(&self, hit: &SearchHit<'_>, selected: bool) -> Line<'static> {
        let (icon, name_style) = match hit.node {
            HitNode::Folder(folder) => (
                folder.icon.clone(),
                Style::default()
                    .fg(self.theme.folder_color(folder.color.as_deref()))
                    .add_modifier(Modifier::BOLD),
            ),
            HitNode::Chat(_) => (CHAT_ICON.to_string(), Style::default().fg(self.theme.chat_fg)),
        };
        let indicator = if selected {
            Span::styled(
                "▸ ",
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("  ")
        };
        let name_style = if selected {
            name_style.bg(self.theme.list_focus_bg)
        } else {
            name_style
        };
        Line::from(vec![
            indicator,
            Span::styled(format!("{} {}", icon, hit.name()), name_style),
            Span::styled(
                format!("  {}", self.location(hit)),
                Style::default().fg(self.theme.dim_fg),
            ),
        ])
    }
}

impl Widget for SearchWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 5 || area.width < 20 {
            return;
        }

        let dialog_width = (area.width * 60 / 100).clamp(30, 80);
        let dialog_height = (area.height * 60 / 100).clamp(8, 30);
        let rect = centered_rect(dialog_width, dialog_height, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let query = &self.state.query;
        let pos = self.state.cursor_position.min(query.len());
        let (before, rest) = query.split_at(pos);
        let mut rest_chars = rest.chars();
        let cursor = rest_chars.next().map(String::from).unwrap_or_else(|| " ".into());
        let after: String = rest_chars.collect();

        let input_style = Style::default().fg(self.theme.list_fg);
        let input_line = Line::from(vec![
            Span::styled(
                "> ",
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(before.to_string(), input_style),
            Span::styled(
                cursor,
                Style::default()
                    .bg(self.theme.list_fg)
                    .fg(self.theme.dialog_bg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y, &input_line, inner.width);

        if inner.height > 1 {
            let count = if query.trim().is_empty() {
                "Type to search...".to_string()
            } else {
                format!(
                    "{} result{}",
                    self.hits.len(),
                    if self.hits.len() == 1 { "" } else { "s" }
                )
            };
            let sep = Line::from(Span::styled(
                format!("─── {} ", count),
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, inner.y + 1, &sep, inner.width);
        }

        // Rows between the counter and the hint line.
        let visible = inner.height.saturating_sub(3) as usize;
        let scroll = self.state.selected.saturating_sub(visible.saturating_sub(1));
        for (row, (index, hit)) in self
            .hits
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible)
            .enumerate()
        {
            let line = self.hit_line(hit, index == self.state.selected);
            buf.set_line(inner.x, inner.y + 2 + row as u16, &line, inner.width);
        }

        if inner.height > 3 {
            let hint = Line::from(Span::styled(
                "[Enter] Go to  [Esc] Close  [↑↓] Navigate",
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
            buf.set_line(inner.x, inner.bottom() - 1, &hint, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_to_string;
    use crate::folders::search::search;
    use crate::folders::{Chat, Folder};
    use crate::theme::dark_theme;

    fn tree() -> Tree {
        let mut plans = Folder::new("Plans");
        plans.chats.push(Chat::new("roadmap", "https://x/app/2"));
        let mut work = Folder::new("Work");
        work.folders.push(plans);
        work.chats.push(Chat::new("road trip", "https://x/app/1"));
        Tree::new(vec![work])
    }

    fn render(state: &SearchState, tree: &Tree, area: Rect) -> String {
        let theme = dark_theme();
        let hits = search(tree, &state.query);
        let mut buf = Buffer::empty(area);
        SearchWidget::new(state, &hits, tree, &theme).render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn empty_query_prompts() {
        let tree = tree();
        let content = render(&SearchState::default(), &tree, Rect::new(0, 0, 80, 24));
        assert!(content.contains("Search"));
        assert!(content.contains("Type to search"));
    }

    #[test]
    fn hits_show_name_and_location() {
        let tree = tree();
        let state = SearchState {
            query: "road".into(),
            cursor_position: 4,
            selected: 1,
        };
        let content = render(&state, &tree, Rect::new(0, 0, 100, 24));
        assert!(content.contains("2 results"));
        assert!(content.contains("road trip"));
        assert!(content.contains("roadmap"));
        assert!(content.contains("/ Work / Plans"));
        assert!(content.contains("▸"));
    }

    #[test]
    fn small_area_no_panic() {
        let tree = tree();
        let state = SearchState {
            query: "w".into(),
            cursor_position: 1,
            selected: 0,
        };
        render(&state, &tree, Rect::new(0, 0, 10, 3));
        render(&state, &tree, Rect::new(0, 0, 20, 5));
    }
}
