//! Aggregate counts over the graph store

use serde::{Deserialize, Serialize};

/// Database statistics, counted from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Stored episodes
    pub episodes: usize,
    /// Distinct entity names
    pub entities: usize,
    /// Entity versions across all names
    pub entity_versions: usize,
    /// Distinct relation keys
    pub relations: usize,
    /// Relation versions across all keys
    pub relation_versions: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} episodes, {} entities ({} versions), {} relations ({} versions)",
            self.episodes, self.entities, self.entity_versions, self.relations,
            self.relation_versions
        )
    }
}
