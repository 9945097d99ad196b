//! In-memory reference backend
//!
//! One `tokio::sync::RwLock` guards the whole graph: writers serialize
//! against each other (the coarse discipline the concurrency contract
//! allows), readers share. Entity and relation tables are `BTreeMap`s so
//! every listing iterates in a deterministic order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use engram_core::relation::check_weight;
use engram_core::{Entity, Episode, GraphStats, MemoryError, Relation, RelationKey, Result};

use crate::backend::{GraphBackend, IngestBatch, UpsertOutcome};

/// Weight differences at or below this are treated as identical on upsert.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Default)]
struct GraphInner {
    episodes: Vec<Episode>,
    episode_index: HashMap<Uuid, usize>,
    entities: BTreeMap<String, Vec<Entity>>,
    relations: BTreeMap<RelationKey, Vec<Relation>>,
    episode_entities: HashMap<Uuid, Vec<String>>,
    last_ingestion: Option<DateTime<Utc>>,
}

impl GraphInner {
    /// An endpoint satisfies a relation if any version of the name started
    /// at or before the relation's `valid_from`.
    fn entity_exists_at(&self, name: &str, ts: DateTime<Utc>) -> bool {
        self.entities
            .get(name)
            .map_or(false, |versions| versions.iter().any(|e| e.valid_from <= ts))
    }

    /// Commit-time clock: wall clock, but never behind the previous commit,
    /// so `ingestion_time` is non-decreasing in insertion order.
    fn next_ingestion_time(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_ingestion {
            if now < last {
                now = last;
            }
        }
        self.last_ingestion = Some(now);
        now
    }

    fn check_endpoints(&self, relation: &Relation, batch_entities: &[Entity]) -> Result<()> {
        for endpoint in [&relation.from_entity, &relation.to_entity] {
            let in_batch = batch_entities
                .iter()
                .any(|e| &e.name == endpoint && e.valid_from <= relation.valid_from);
            if !in_batch && !self.entity_exists_at(endpoint, relation.valid_from) {
                return Err(MemoryError::Validation(format!(
                    "relation endpoint '{}' did not exist at {}",
                    endpoint, relation.valid_from
                )));
            }
        }
        Ok(())
    }

    /// The close-then-open policy. Caller holds the write lock, so the pair
    /// of mutations is atomic with respect to every reader and writer.
    fn upsert_locked(&mut self, relation: Relation, now: DateTime<Utc>) -> UpsertOutcome {
        let key = relation.key();
        let versions = self.relations.entry(key.clone()).or_default();

        if let Some(open) = versions.iter_mut().find(|v| v.is_currently_valid()) {
            let same_weight = (open.weight - relation.weight).abs() <= WEIGHT_TOLERANCE;
            let same_context = open.context == relation.context;
            if same_weight && same_context {
                return UpsertOutcome::Unchanged;
            }

            open.valid_to = Some(now);
            open.invalidated_at = Some(now);
            let old_weight = open.weight;

            let mut fresh = relation;
            fresh.valid_from = now;
            fresh.valid_to = None;
            fresh.invalidated_at = None;
            versions.push(fresh);

            tracing::debug!(
                from = %key.from_entity,
                to = %key.to_entity,
                relation_type = %key.relation_type,
                old_weight,
                new_weight = versions.last().map(|v| v.weight).unwrap_or_default(),
                "Relation version superseded"
            );
            UpsertOutcome::Superseded
        } else {
            versions.push(relation);
            UpsertOutcome::Inserted
        }
    }
}

/// In-memory graph store. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    inner: Arc<RwLock<GraphInner>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphBackend for MemoryGraphStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn ingest(&self, batch: IngestBatch) -> Result<()> {
        let mut inner = self.inner.write().await;

        // Validate the whole batch before touching state; a rejected batch
        // leaves nothing behind.
        if inner.episode_index.contains_key(&batch.episode.uuid) {
            return Err(MemoryError::Ingest(format!(
                "episode {} already stored",
                batch.episode.uuid
            )));
        }
        for entity in &batch.entities {
            entity.check_interval()?;
        }
        for relation in &batch.relations {
            check_weight(relation.weight)?;
            relation.check_interval()?;
            inner.check_endpoints(relation, &batch.entities)?;
        }

        let now = inner.next_ingestion_time();
        let mut episode = batch.episode;
        episode.ingestion_time = now;
        let uuid = episode.uuid;

        let links: Vec<String> = batch.entities.iter().map(|e| e.name.clone()).collect();
        inner.episode_entities.insert(uuid, links);
        let slot = inner.episodes.len();
        inner.episode_index.insert(uuid, slot);
        inner.episodes.push(episode);

        for entity in batch.entities {
            inner.entities.entry(entity.name.clone()).or_default().push(entity);
        }
        for relation in batch.relations {
            inner.upsert_locked(relation, now);
        }

        tracing::debug!(episode = %uuid, "Ingest batch committed");
        Ok(())
    }

    async fn episode(&self, uuid: Uuid) -> Result<Option<Episode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .episode_index
            .get(&uuid)
            .map(|&slot| inner.episodes[slot].clone()))
    }

    async fn episodes(&self) -> Result<Vec<Episode>> {
        Ok(self.inner.read().await.episodes.clone())
    }

    async fn insert_entity(&self, entity: Entity) -> Result<()> {
        entity.check_interval()?;
        let mut inner = self.inner.write().await;
        inner.entities.entry(entity.name.clone()).or_default().push(entity);
        Ok(())
    }

    async fn entity_versions(&self, name: &str) -> Result<Vec<Entity>> {
        let inner = self.inner.read().await;
        Ok(inner.entities.get(name).cloned().unwrap_or_default())
    }

    async fn entity_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.entities.keys().cloned().collect())
    }

    async fn upsert_relation(&self, relation: Relation) -> Result<UpsertOutcome> {
        check_weight(relation.weight)?;
        relation.check_interval()?;
        let mut inner = self.inner.write().await;
        inner.check_endpoints(&relation, &[])?;
        let now = inner.next_ingestion_time();
        Ok(inner.upsert_locked(relation, now))
    }

    async fn relation_versions(&self, key: &RelationKey) -> Result<Vec<Relation>> {
        let inner = self.inner.read().await;
        Ok(inner.relations.get(key).cloned().unwrap_or_default())
    }

    async fn relations_of(&self, entity: &str) -> Result<Vec<Relation>> {
        let inner = self.inner.read().await;
        let mut out = Vec::new();
        for (key, versions) in &inner.relations {
            if key.from_entity == entity || key.to_entity == entity {
                out.extend(versions.iter().cloned());
            }
        }
        Ok(out)
    }

    async fn entities_of_episode(&self, uuid: Uuid) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.episode_entities.get(&uuid).cloned().unwrap_or_default())
    }

    async fn stats(&self) -> Result<GraphStats> {
        let inner = self.inner.read().await;
        Ok(GraphStats {
            episodes: inner.episodes.len(),
            entities: inner.entities.len(),
            entity_versions: inner.entities.values().map(Vec::len).sum(),
            relations: inner.relations.len(),
            relation_versions: inner.relations.values().map(Vec::len).sum(),
        })
    }
}
