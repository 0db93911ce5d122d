use chrono::{DateTime, Utc};

use crate::dataset::Dataset;
use crate::engine::{self, FilterState, Leaderboard};
use crate::loader::{Loaded, Source};

/// Loaded dataset plus the values derived from it once per load.
#[derive(Clone, Debug)]
pub struct Board {
    source: Source,
    dataset: Dataset,
    last_modified: Option<DateTime<Utc>>,
    team_total: u64,
    assignment_types: Vec<String>,
}

impl Board {
    pub fn new(source: Source, dataset: Dataset, last_modified: Option<DateTime<Utc>>) -> Self {
        let team_total = dataset.team_total();
        let assignment_types = dataset.assignment_types();
        Self {
            source,
            dataset,
            last_modified,
            team_total,
            assignment_types,
        }
    }

    pub fn from_loaded(loaded: Loaded) -> Self {
        Self::new(loaded.source, loaded.dataset, loaded.last_modified)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn team_total(&self) -> u64 {
        self.team_total
    }

    pub fn assignment_types(&self) -> &[String] {
        &self.assignment_types
    }

    pub fn initial_filter(&self) -> FilterState {
        FilterState::initial(&self.dataset)
    }

    pub fn leaderboard(&self, filter: &FilterState) -> Leaderboard {
        engine::build_leaderboard(&self.dataset, filter)
    }
}
