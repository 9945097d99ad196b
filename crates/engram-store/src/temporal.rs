//! Point-in-time reconstruction over the bi-temporal store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use engram_core::{Entity, Relation, Result};

use crate::backend::GraphBackend;

/// The reconstructed state of an entity as of one instant.
///
/// An unknown entity or a timestamp outside every validity interval yields
/// an empty snapshot: a legitimate "no known state" answer, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The entity asked about
    pub entity_name: String,
    /// The instant reconstructed
    pub at: DateTime<Utc>,
    /// The entity version valid at `at`, if any
    pub entity: Option<Entity>,
    /// Relations valid at `at` that touch the entity
    pub relations: Vec<Relation>,
}

impl Snapshot {
    /// Whether the store knew nothing about the entity at this instant.
    pub fn is_empty(&self) -> bool {
        self.entity.is_none() && self.relations.is_empty()
    }
}

/// As-of query support over a graph backend.
#[derive(Debug)]
pub struct TemporalIndex<B: GraphBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: GraphBackend + ?Sized> TemporalIndex<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Reconstruct the entity and its relations as they were at `at`.
    ///
    /// Selection predicate: `valid_from <= at` and `valid_to` unset or
    /// strictly after `at`. If more than one entity version satisfies it
    /// (an invariant breach upstream), the one with the latest `valid_from`
    /// wins and the anomaly is logged for observability.
    pub async fn snapshot(&self, entity_name: &str, at: DateTime<Utc>) -> Result<Snapshot> {
        let mut matching: Vec<Entity> = self
            .backend
            .entity_versions(entity_name)
            .await?
            .into_iter()
            .filter(|v| v.is_valid_at(at))
            .collect();

        if matching.len() > 1 {
            tracing::warn!(
                entity = %entity_name,
                at = %at,
                versions = matching.len(),
                "Multiple entity versions valid at one instant; using latest valid_from"
            );
        }
        matching.sort_by_key(|v| v.valid_from);
        let entity = matching.pop();

        let relations: Vec<Relation> = self
            .backend
            .relations_of(entity_name)
            .await?
            .into_iter()
            .filter(|r| r.is_valid_at(at))
            .collect();

        Ok(Snapshot {
            entity_name: entity_name.to_string(),
            at,
            entity,
            relations,
        })
    }
}
