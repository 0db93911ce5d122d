//! Filter, aggregate and rank a [`Dataset`] for display.
//!
//! Everything here is a pure function of the dataset and a [`FilterState`];
//! renderers consume the resulting [`Leaderboard`].

use std::cmp::Ordering;

use indexmap::IndexSet;
use serde::Serialize;

use crate::dataset::{Dataset, TYPE_DELIMITER};

/// Number of leading rows marked as podium places in ranked mode.
pub const PODIUM_SIZE: usize = 3;

/// Assignment-type prefixes currently selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeSelection {
    prefixes: IndexSet<String>,
}

impl TypeSelection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all(dataset: &Dataset) -> Self {
        Self::from_prefixes(dataset.assignment_types())
    }

    pub fn from_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(|p| p.as_str())
    }

    /// Flips one prefix; returns whether it is selected afterwards.
    pub fn toggle(&mut self, prefix: &str) -> bool {
        if self.prefixes.shift_remove(prefix) {
            false
        } else {
            self.prefixes.insert(prefix.to_string());
            true
        }
    }

    /// Prefix match against any selected type.
    pub fn matches(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub types: TypeSelection,
}

impl FilterState {
    /// Empty search with every type of the dataset selected.
    pub fn initial(dataset: &Dataset) -> Self {
        Self {
            search: String::new(),
            types: TypeSelection::all(dataset),
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.search.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignmentEntry {
    pub display_name: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewItem {
    pub name: String,
    pub filtered_score: u64,
    pub assignments: Vec<AssignmentEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Search term present: no ranks, details expanded.
    Profile,
    /// More than one row without a search: numeric ranks and podium.
    Ranked,
    /// Zero or one row without a search.
    Unranked,
}

impl DisplayMode {
    pub fn select(is_searching: bool, rows: usize) -> Self {
        if is_searching {
            DisplayMode::Profile
        } else if rows > 1 {
            DisplayMode::Ranked
        } else {
            DisplayMode::Unranked
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowMarker {
    Rank { position: usize, podium: bool },
    Icon,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Row {
    pub marker: RowMarker,
    pub expanded: bool,
    #[serde(flatten)]
    pub item: ViewItem,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub mode: DisplayMode,
    pub rows: Vec<Row>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row activation: flips one detail panel, leaving the others untouched.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let row = self.rows.get_mut(index)?;
        row.expanded = !row.expanded;
        Some(row.expanded)
    }

    pub fn expand_all(&mut self) {
        for row in self.rows.iter_mut() {
            row.expanded = true;
        }
    }

    /// Finds a row by 1-based position or case-insensitive exact name.
    pub fn find(&self, needle: &str) -> Option<usize> {
        let needle = needle.trim();
        if let Ok(pos) = needle.parse::<usize>() {
            if pos >= 1 && pos <= self.rows.len() {
                return Some(pos - 1);
            }
        }
        let lower = needle.to_lowercase();
        self.rows
            .iter()
            .position(|r| r.item.name.to_lowercase() == lower)
    }
}

pub fn display_name(key: &str) -> String {
    key.replace(TYPE_DELIMITER, " ")
}

/// Filters, aggregates and sorts the dataset. Persons with a zero filtered
/// score or whose name does not contain the search term are dropped.
pub fn compute_view(dataset: &Dataset, filter: &FilterState) -> Vec<ViewItem> {
    let needle = filter.search.to_lowercase();

    let mut items: Vec<ViewItem> = dataset
        .iter()
        .map(|(name, record)| {
            let assignments: Vec<AssignmentEntry> = record
                .graded_assignments
                .iter()
                .filter(|(key, _)| filter.types.matches(key))
                .map(|(key, count)| AssignmentEntry {
                    display_name: display_name(key),
                    count: *count,
                })
                .collect();
            let filtered_score = assignments
                .iter()
                .map(|a| a.count)
                .fold(0u64, u64::saturating_add);
            ViewItem {
                name: name.to_string(),
                filtered_score,
                assignments,
            }
        })
        .filter(|item| item.filtered_score > 0 && item.name.to_lowercase().contains(&needle))
        .collect();

    items.sort_by(compare_items);
    items
}

fn compare_items(a: &ViewItem, b: &ViewItem) -> Ordering {
    b.filtered_score
        .cmp(&a.filtered_score)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

pub fn build_leaderboard(dataset: &Dataset, filter: &FilterState) -> Leaderboard {
    decorate(compute_view(dataset, filter), filter.is_searching())
}

/// Applies rank markers and initial expand state for the chosen display mode.
pub fn decorate(items: Vec<ViewItem>, is_searching: bool) -> Leaderboard {
    let mode = DisplayMode::select(is_searching, items.len());
    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = match mode {
                DisplayMode::Ranked => RowMarker::Rank {
                    position: index + 1,
                    podium: index < PODIUM_SIZE,
                },
                DisplayMode::Profile | DisplayMode::Unranked => RowMarker::Icon,
            };
            Row {
                marker,
                expanded: mode == DisplayMode::Profile,
                item,
            }
        })
        .collect();
    Leaderboard { mode, rows }
}
