//! Theme data model: built-in palettes, folder color tags, and resolution
//! from config.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Listing
    pub list_fg: Color,
    pub list_selected_bg: Color,
    pub list_focus_bg: Color,
    pub folder_fg: Color,
    pub chat_fg: Color,
    pub cut_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    pub border_fg: Color,
    pub border_focused_fg: Color,

    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Semantic colors
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,

    /// Colors for the folder tags, in `FOLDER_COLORS` order minus "default".
    pub tags: TagColors,
}

/// Palette entries for folder color tags.
#[derive(Debug, Clone)]
pub struct TagColors {
    pub red: Color,
    pub orange: Color,
    pub yellow: Color,
    pub green: Color,
    pub blue: Color,
    pub purple: Color,
    pub pink: Color,
    pub grey: Color,
}

impl ThemeColors {
    /// Foreground for a folder tagged `color`; untagged, "default", and
    /// unknown tags use the plain folder color.
    pub fn folder_color(&self, color: Option<&str>) -> Color {
        match color.unwrap_or("default") {
            "red" => self.tags.red,
            "orange" => self.tags.orange,
            "yellow" => self.tags.yellow,
            "green" => self.tags.green,
            "blue" => self.tags.blue,
            "purple" => self.tags.purple,
            "pink" => self.tags.pink,
            "grey" | "gray" => self.tags.grey,
            _ => self.folder_fg,
        }
    }
}

/// Dark theme using the Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        list_fg: Color::Rgb(205, 214, 244),          // text
        list_selected_bg: Color::Rgb(88, 91, 112),   // surface2
        list_focus_bg: Color::Rgb(69, 71, 90),       // surface1
        folder_fg: Color::Rgb(180, 190, 254),        // lavender
        chat_fg: Color::Rgb(205, 214, 244),
        cut_fg: Color::Rgb(108, 112, 134),           // overlay0

        status_bg: Color::Rgb(30, 30, 46), // base
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),
        border_focused_fg: Color::Rgb(137, 180, 250),

        dialog_bg: Color::Rgb(49, 50, 68), // surface0
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),
        warning_fg: Color::Rgb(249, 226, 175),
        success_fg: Color::Rgb(166, 227, 161),
        info_fg: Color::Rgb(137, 180, 250),
        accent_fg: Color::Rgb(203, 166, 247),
        dim_fg: Color::Rgb(108, 112, 134),

        tags: TagColors {
            red: Color::Rgb(243, 139, 168),
            orange: Color::Rgb(250, 179, 135), // peach
            yellow: Color::Rgb(249, 226, 175),
            green: Color::Rgb(166, 227, 161),
            blue: Color::Rgb(137, 180, 250),
            purple: Color::Rgb(203, 166, 247), // mauve
            pink: Color::Rgb(245, 194, 231),
            grey: Color::Rgb(147, 153, 178), // overlay2
        },
    }
}

/// Light theme using the Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        list_fg: Color::Rgb(76, 79, 105),
        list_selected_bg: Color::Rgb(172, 176, 190),
        list_focus_bg: Color::Rgb(204, 208, 218),
        folder_fg: Color::Rgb(114, 135, 253),
        chat_fg: Color::Rgb(76, 79, 105),
        cut_fg: Color::Rgb(156, 160, 176),

        status_bg: Color::Rgb(239, 241, 245),
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190),
        border_focused_fg: Color::Rgb(30, 102, 245),

        dialog_bg: Color::Rgb(230, 233, 239),
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),
        warning_fg: Color::Rgb(223, 142, 29),
        success_fg: Color::Rgb(64, 160, 43),
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239),
        dim_fg: Color::Rgb(156, 160, 176),

        tags: TagColors {
            red: Color::Rgb(210, 15, 57),
            orange: Color::Rgb(254, 100, 11),
            yellow: Color::Rgb(223, 142, 29),
            green: Color::Rgb(64, 160, 43),
            blue: Color::Rgb(30, 102, 245),
            purple: Color::Rgb(136, 57, 239),
            pink: Color::Rgb(234, 118, 203),
            grey: Color::Rgb(124, 127, 147),
        },
    }
}

/// Parse `"#aabbcc"` (leading `#` optional). `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn override_with(slot: &mut Color, hex: Option<&str>) {
    if let Some(color) = hex.and_then(parse_hex_color) {
        *slot = color;
    }
}

/// Resolve the final `ThemeColors` from config.
///
/// `"light"` selects the light palette. `"custom"` starts from the dark
/// palette and applies the hex overrides. Anything else is dark.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    override_with(&mut theme.list_fg, custom.list_fg.as_deref());
    override_with(&mut theme.list_selected_bg, custom.list_selected_bg.as_deref());
    override_with(&mut theme.folder_fg, custom.folder_fg.as_deref());
    override_with(&mut theme.chat_fg, custom.chat_fg.as_deref());
    override_with(&mut theme.status_bg, custom.status_bg.as_deref());
    override_with(&mut theme.status_fg, custom.status_fg.as_deref());
    override_with(&mut theme.border_fg, custom.border_fg.as_deref());
    override_with(&mut theme.dialog_bg, custom.dialog_bg.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::node::FOLDER_COLORS;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_resolve_schemes() {
        let light = resolve_theme(&ThemeConfig {
            scheme: Some("light".into()),
            custom: None,
        });
        assert_eq!(light.folder_fg, Color::Rgb(114, 135, 253));

        let fallback = resolve_theme(&ThemeConfig {
            scheme: Some("neon".into()),
            custom: None,
        });
        assert_eq!(fallback.folder_fg, dark_theme().folder_fg);
    }

    #[test]
    fn test_resolve_custom_overrides() {
        let theme = resolve_theme(&ThemeConfig {
            scheme: Some("custom".into()),
            custom: Some(ThemeColorsConfig {
                folder_fg: Some("#010203".into()),
                chat_fg: Some("not-a-color".into()),
                ..Default::default()
            }),
        });
        assert_eq!(theme.folder_fg, Color::Rgb(1, 2, 3));
        assert_eq!(theme.chat_fg, dark_theme().chat_fg);
    }

    #[test]
    fn every_palette_tag_has_a_distinct_color() {
        let theme = dark_theme();
        for name in FOLDER_COLORS.iter().filter(|c| **c != "default") {
            assert_ne!(theme.folder_color(Some(name)), theme.folder_fg, "{}", name);
        }
        assert_eq!(theme.folder_color(None), theme.folder_fg);
        assert_eq!(theme.folder_color(Some("default")), theme.folder_fg);
        assert_eq!(theme.folder_color(Some("teal")), theme.folder_fg);
    }
}
