//! Sorting configuration and logic for object listings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::providers::RemoteObject;

// ============================================================================
// Sorting configuration
// ============================================================================

/// Column to sort objects by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    LastModified,
}

/// Sort order (ascending or descending).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// The (key, order) pair controlling display order. Starts at (Name, Asc).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Clicking the active column flips the order; any other column starts
    /// ascending, whatever order it had last time.
    pub fn set_sort(&mut self, key: SortKey) {
        if self.key == key {
            self.order = self.order.toggled();
        } else {
            self.key = key;
            self.order = SortOrder::Asc;
        }
    }
}

// ============================================================================
// Sorting logic
// ============================================================================

/// Compares names case-insensitively, then by exact code points so that
/// "Apple" lands before "apple".
fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Compares two objects under `spec`. Equal objects stay `Equal` so the
/// caller's stable sort keeps their collection order.
pub fn compare_objects(a: &RemoteObject, b: &RemoteObject, spec: SortSpec) -> Ordering {
    let primary = match spec.key {
        SortKey::Name => compare_names(a.sort_name(), b.sort_name()),
        SortKey::LastModified => a.sort_instant().cmp(&b.sort_instant()),
    };

    match spec.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    }
}

/// Returns the objects in display order without touching `objects`.
pub fn sorted_view(objects: &[RemoteObject], spec: SortSpec) -> Vec<RemoteObject> {
    let mut view = objects.to_vec();
    // slice::sort_by is stable
    view.sort_by(|a, b| compare_objects(a, b, spec));
    view
}
