//! Graph storage backend trait

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use engram_core::{Entity, Episode, GraphStats, Relation, RelationKey, Result};

/// One episode plus the graph delta extracted from it.
///
/// A batch commits atomically: either the episode, every entity version,
/// every relation transition, and the provenance links all become visible
/// together, or nothing does.
#[derive(Debug, Clone)]
pub struct IngestBatch {
    pub episode: Episode,
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl IngestBatch {
    /// A batch carrying only the episode, no graph delta.
    pub fn episode_only(episode: Episode) -> Self {
        Self {
            episode,
            entities: Vec::new(),
            relations: Vec::new(),
        }
    }
}

/// What an upsert did to the relation's version history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No currently-valid version existed; a new one was opened
    Inserted,
    /// The open version was closed and a new version opened at now
    Superseded,
    /// An equivalent version was already valid; nothing changed
    Unchanged,
}

/// Generic graph storage backend (object safe).
///
/// Write operations serialize against each other inside the backend;
/// reads observe a consistent snapshot of the store as of call time.
#[async_trait]
pub trait GraphBackend: Send + Sync + Debug {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Check if the backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Commit a batch atomically. The episode's `ingestion_time` is stamped
    /// at commit and is non-decreasing in commit order.
    async fn ingest(&self, batch: IngestBatch) -> Result<()>;

    /// Fetch one episode by uuid
    async fn episode(&self, uuid: Uuid) -> Result<Option<Episode>>;

    /// All episodes in append order
    async fn episodes(&self) -> Result<Vec<Episode>>;

    /// Insert one entity version
    async fn insert_entity(&self, entity: Entity) -> Result<()>;

    /// All versions recorded for an entity name (empty if unknown)
    async fn entity_versions(&self, name: &str) -> Result<Vec<Entity>>;

    /// All known entity names, in deterministic order
    async fn entity_names(&self) -> Result<Vec<String>>;

    /// Close-then-open relation upsert.
    ///
    /// If an equivalent relation (same from/to/type) is currently valid and
    /// the new weight differs by more than 1e-9 or the context differs at
    /// all, the old version is closed (`valid_to` and `invalidated_at` set
    /// to now) and a new version opened at now, as one atomic transition.
    /// An identical relation is a no-op.
    async fn upsert_relation(&self, relation: Relation) -> Result<UpsertOutcome>;

    /// All versions recorded for a relation key (empty if unknown)
    async fn relation_versions(&self, key: &RelationKey) -> Result<Vec<Relation>>;

    /// All relation versions touching an entity, in deterministic order
    async fn relations_of(&self, entity: &str) -> Result<Vec<Relation>>;

    /// Provenance: names of entities extracted from the given episode
    async fn entities_of_episode(&self, uuid: Uuid) -> Result<Vec<String>>;

    /// Aggregate counts
    async fn stats(&self) -> Result<GraphStats>;
}
