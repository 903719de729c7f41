use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::folders::node::{Chat, Folder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    /// Nodes carry no timestamps, so this orders by name as well.
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMode {
    #[serde(default)]
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortMode {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn toggle_direction(&mut self) {
        self.direction = match self.direction {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        };
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            SortField::Name => SortField::Date,
            SortField::Date => SortField::Name,
        };
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Name => "name",
            SortField::Date => "date",
        };
        let arrow = match self.direction {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        };
        write!(f, "{} {}", field, arrow)
    }
}

/// Anything with a name to order by.
pub trait Named {
    fn sort_name(&self) -> &str;
}

impl Named for Folder {
    fn sort_name(&self) -> &str {
        &self.name
    }
}

impl Named for Chat {
    fn sort_name(&self) -> &str {
        &self.title
    }
}

impl<T: Named + ?Sized> Named for &T {
    fn sort_name(&self) -> &str {
        (**self).sort_name()
    }
}

fn compare<T: Named>(a: &T, b: &T) -> Ordering {
    a.sort_name()
        .to_lowercase()
        .cmp(&b.sort_name().to_lowercase())
}

/// Order items by lower-cased name without touching the input.
///
/// The sort is stable, so equal names keep their original relative order in
/// both directions.
pub fn sorted<T: Named>(items: impl IntoIterator<Item = T>, mode: SortMode) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    // Both fields share the name comparator.
    match mode.direction {
        SortDirection::Asc => items.sort_by(compare),
        SortDirection::Desc => items.sort_by(|a, b| compare(b, a)),
    }
    items
}
