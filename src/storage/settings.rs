use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::folders::sort::SortMode;

pub const COPY_LAST: &str = "copyLast";
pub const COPY_ALL: &str = "copyAll";
pub const WIDE_MODE: &str = "wideMode";
pub const NEW_CHAT: &str = "newChat";

/// A key combination bound to a named action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Shortcut {
    pub fn new(key: &str, ctrl: bool, alt: bool, shift: bool) -> Self {
        Self {
            key: key.to_string(),
            ctrl,
            alt,
            shift,
        }
    }

    /// `Ctrl+Alt+Shift+K` style label, or `Not set`.
    pub fn label(&self) -> String {
        if self.key.is_empty() {
            return "Not set".to_string();
        }
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.to_uppercase());
        parts.join("+")
    }

    /// Whether a key press triggers this shortcut. The key compares
    /// case-insensitively; modifiers must match exactly.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if self.key.is_empty() {
            return false;
        }
        let KeyCode::Char(c) = key.code else {
            return false;
        };
        c.to_lowercase().eq(self.key.to_lowercase().chars())
            && key.modifiers.contains(KeyModifiers::CONTROL) == self.ctrl
            && key.modifiers.contains(KeyModifiers::ALT) == self.alt
            && key.modifiers.contains(KeyModifiers::SHIFT) == self.shift
    }
}

pub fn default_shortcuts() -> BTreeMap<String, Shortcut> {
    BTreeMap::from([
        (COPY_LAST.to_string(), Shortcut::new("c", false, true, false)),
        (COPY_ALL.to_string(), Shortcut::new("c", false, true, true)),
        (WIDE_MODE.to_string(), Shortcut::new("w", false, true, false)),
        (NEW_CHAT.to_string(), Shortcut::new("n", false, true, false)),
    ])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }
}

/// User settings, stored apart from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub wide_mode: bool,
    #[serde(default = "default_shortcuts")]
    pub shortcuts: BTreeMap<String, Shortcut>,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub sort_mode: SortMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wide_mode: false,
            shortcuts: default_shortcuts(),
            view_mode: ViewMode::default(),
            sort_mode: SortMode::default(),
        }
    }
}

impl Settings {
    /// Read stored settings; missing fields take defaults, unreadable data
    /// yields all defaults.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("discarding unreadable settings: {}", e);
            Settings::default()
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    pub fn shortcut(&self, action: &str) -> Option<&Shortcut> {
        self.shortcuts.get(action)
    }

    /// Label for an action's shortcut, `Not set` when unbound.
    pub fn shortcut_label(&self, action: &str) -> String {
        self.shortcut(action)
            .map(Shortcut::label)
            .unwrap_or_else(|| "Not set".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::sort::{SortDirection, SortField};
    use serde_json::json;

    #[test]
    fn default_labels() {
        let settings = Settings::default();
        assert_eq!(settings.shortcut_label(COPY_LAST), "Alt+C");
        assert_eq!(settings.shortcut_label(COPY_ALL), "Alt+Shift+C");
        assert_eq!(settings.shortcut_label(WIDE_MODE), "Alt+W");
        assert_eq!(settings.shortcut_label(NEW_CHAT), "Alt+N");
        assert_eq!(settings.shortcut_label("missing"), "Not set");
        assert_eq!(Shortcut::default().label(), "Not set");
        assert_eq!(Shortcut::new("k", true, true, true).label(), "Ctrl+Alt+Shift+K");
    }

    #[test]
    fn stored_settings_use_camel_case() {
        let settings = Settings::from_value(json!({
            "wideMode": true,
            "viewMode": "list",
            "sortMode": {"field": "date", "direction": "desc"}
        }));
        assert!(settings.wide_mode);
        assert_eq!(settings.view_mode, ViewMode::List);
        assert_eq!(settings.sort_mode, SortMode::new(SortField::Date, SortDirection::Desc));
        // Shortcuts were absent, so the defaults apply.
        assert_eq!(settings.shortcuts, default_shortcuts());

        let value = settings.to_value();
        assert_eq!(value["wideMode"], json!(true));
        assert_eq!(value["shortcuts"]["newChat"]["key"], json!("n"));
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        assert_eq!(Settings::from_value(json!("nope")), Settings::default());
        assert_eq!(Settings::from_value(json!({"viewMode": "tiles"})), Settings::default());
    }

    #[test]
    fn shortcut_matching_checks_modifiers() {
        let wide = Shortcut::new("w", false, true, false);
        assert!(wide.matches(&KeyEvent::new(KeyCode::Char('w'), KeyModifiers::ALT)));
        assert!(!wide.matches(&KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE)));
        assert!(!wide.matches(&KeyEvent::new(
            KeyCode::Char('w'),
            KeyModifiers::ALT | KeyModifiers::CONTROL
        )));

        let copy_all = Shortcut::new("c", false, true, true);
        assert!(copy_all.matches(&KeyEvent::new(
            KeyCode::Char('C'),
            KeyModifiers::ALT | KeyModifiers::SHIFT
        )));
        assert!(!Shortcut::default().matches(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));
    }

    #[test]
    fn view_mode_toggles() {
        assert_eq!(ViewMode::Grid.toggle(), ViewMode::List);
        assert_eq!(ViewMode::List.toggle().label(), "grid");
    }
}
