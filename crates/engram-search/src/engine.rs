//! The hybrid search engine

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use engram_core::{MemoryError, Result};
use engram_extract::Embedder;
use engram_store::GraphBackend;

use crate::lexical::{token_set, tokenize};
use crate::result::{EntityHit, ScoredResult};

/// Signal weights for the combined score. Must each be non-negative and
/// sum to 1, so the combination stays inside `[0,1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchWeights {
    pub semantic: f64,
    pub lexical: f64,
    pub graph: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            lexical: 0.3,
            graph: 0.2,
        }
    }
}

impl SearchWeights {
    pub fn check(&self) -> Result<()> {
        for (label, w) in [
            ("semantic", self.semantic),
            ("lexical", self.lexical),
            ("graph", self.graph),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(MemoryError::Validation(format!(
                    "search weight {} = {} outside [0,1]",
                    label, w
                )));
            }
        }
        let sum = self.semantic + self.lexical + self.graph;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(MemoryError::Validation(format!(
                "search weights sum to {}, expected 1",
                sum
            )));
        }
        Ok(())
    }
}

/// Hybrid relevance engine over a graph backend and an embedding provider.
///
/// Episode vectors are computed once and cached per uuid (episodes are
/// immutable, so the cache never goes stale).
#[derive(Debug)]
pub struct SearchEngine<B: GraphBackend + ?Sized> {
    backend: Arc<B>,
    embedder: Arc<dyn Embedder>,
    weights: SearchWeights,
    episode_vectors: RwLock<HashMap<Uuid, Vec<f32>>>,
}

impl<B: GraphBackend + ?Sized> SearchEngine<B> {
    pub fn new(backend: Arc<B>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            backend,
            embedder,
            weights: SearchWeights::default(),
            episode_vectors: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the default signal weights. Rejects weight sets that could
    /// push the combined score outside `[0,1]`.
    pub fn with_weights(mut self, weights: SearchWeights) -> Result<Self> {
        weights.check()?;
        self.weights = weights;
        Ok(self)
    }

    /// Rank episodes against `query`.
    ///
    /// Results below `min_relevance` are dropped BEFORE the `max_results`
    /// cap is applied. Order: score descending, then most recent
    /// `reference_time`, then uuid. That order is total, so identical
    /// inputs produce identical output.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        min_relevance: f64,
    ) -> Result<Vec<ScoredResult>> {
        let query_tokens = tokenize(query);
        let query_vector = self.embed(query).await?;
        let near_entities = self.query_neighborhood(&query_tokens).await?;

        let episodes = self.backend.episodes().await?;
        let mut scored = Vec::with_capacity(episodes.len());
        for episode in episodes {
            let semantic = cosine(&query_vector, &self.episode_vector(&episode.uuid, &episode.content).await?);
            let lexical = crate::lexical::overlap(&query_tokens, &token_set(&episode.content));
            let graph = self.graph_proximity(episode.uuid, &near_entities).await?;

            let score = (self.weights.semantic * clamp01(semantic as f64)
                + self.weights.lexical * lexical
                + self.weights.graph * graph)
                .clamp(0.0, 1.0);

            scored.push(ScoredResult {
                uuid: episode.uuid,
                name: episode.name,
                content: episode.content,
                score,
                reference_time: episode.reference_time,
                group_id: episode.group_id,
            });
        }

        let results = rank(scored, min_relevance, max_results);
        tracing::debug!(query, hits = results.len(), "Episode search complete");
        Ok(results)
    }

    /// Rank currently-valid entities against `query`, optionally filtered
    /// by type BEFORE ranking. Scored on semantic + lexical signals over
    /// the entity's name and summary (renormalized so the score stays in
    /// `[0,1]`).
    pub async fn search_entities(
        &self,
        query: &str,
        entity_type: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<EntityHit>> {
        let query_tokens = tokenize(query);
        let query_vector = self.embed(query).await?;

        let denom = self.weights.semantic + self.weights.lexical;
        let (w_sem, w_lex) = if denom > 0.0 {
            (self.weights.semantic / denom, self.weights.lexical / denom)
        } else {
            (0.5, 0.5)
        };

        let mut hits = Vec::new();
        for name in self.backend.entity_names().await? {
            let versions = self.backend.entity_versions(&name).await?;
            let current = versions
                .into_iter()
                .filter(|v| v.is_currently_valid())
                .max_by_key(|v| v.valid_from);
            let Some(entity) = current else { continue };

            if let Some(wanted) = entity_type {
                if entity.entity_type != wanted {
                    continue;
                }
            }

            let text = match &entity.summary {
                Some(summary) => format!("{} {}", entity.name, summary),
                None => entity.name.clone(),
            };
            let semantic = cosine(&query_vector, &self.embed_raw(&text).await?);
            let lexical = crate::lexical::overlap(&query_tokens, &token_set(&text));
            let score = (w_sem * clamp01(semantic as f64) + w_lex * lexical).clamp(0.0, 1.0);

            hits.push(EntityHit {
                name: entity.name,
                entity_type: entity.entity_type,
                summary: entity.summary,
                created_at: entity.created_at,
                score,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.name.cmp(&b.name))
        });
        hits.truncate(max_results);
        tracing::debug!(query, hits = hits.len(), "Entity search complete");
        Ok(hits)
    }

    /// Entities lexically matched by the query, plus everything one
    /// currently-valid hop away. The proximity signal rewards episodes
    /// whose extracted entities fall inside this neighborhood.
    async fn query_neighborhood(&self, query_tokens: &[String]) -> Result<BTreeSet<String>> {
        let mut matched = BTreeSet::new();
        for name in self.backend.entity_names().await? {
            let name_tokens = token_set(&name);
            if query_tokens.iter().any(|t| name_tokens.contains(t)) {
                matched.insert(name);
            }
        }

        let mut neighborhood = matched.clone();
        for name in &matched {
            for relation in self.backend.relations_of(name).await? {
                if !relation.is_currently_valid() {
                    continue;
                }
                if let Some(other) = relation.other_endpoint(name) {
                    neighborhood.insert(other.to_string());
                }
            }
        }
        Ok(neighborhood)
    }

    async fn graph_proximity(
        &self,
        episode: Uuid,
        neighborhood: &BTreeSet<String>,
    ) -> Result<f64> {
        let entities = self.backend.entities_of_episode(episode).await?;
        if entities.is_empty() {
            return Ok(0.0);
        }
        let near = entities
            .iter()
            .filter(|name| neighborhood.contains(*name))
            .count();
        Ok(near as f64 / entities.len() as f64)
    }

    async fn episode_vector(&self, uuid: &Uuid, content: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.episode_vectors.read().await.get(uuid) {
            return Ok(vector.clone());
        }
        let vector = self.embed_raw(content).await?;
        self.episode_vectors
            .write()
            .await
            .insert(*uuid, vector.clone());
        Ok(vector)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_raw(text).await
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(text)
            .await
            .map_err(|e| MemoryError::unavailable("embedding", e.to_string()))
    }
}

/// Filter-then-truncate with the engine's total order.
pub(crate) fn rank(
    mut results: Vec<ScoredResult>,
    min_relevance: f64,
    max_results: usize,
) -> Vec<ScoredResult> {
    results.retain(|r| r.score >= min_relevance);
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.reference_time.cmp(&a.reference_time))
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
    results.truncate(max_results);
    results
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use engram_core::Episode;
    use engram_extract::{
        ExtractedEntity, ExtractedRelation, Extraction, HashEmbedder,
    };
    use engram_store::{build_batch, IngestBatch, MemoryGraphStore};
    use proptest::prelude::*;

    fn engine(store: Arc<MemoryGraphStore>) -> SearchEngine<MemoryGraphStore> {
        SearchEngine::new(store, Arc::new(HashEmbedder::default()))
    }

    async fn seeded() -> (Arc<MemoryGraphStore>, Uuid) {
        let store = Arc::new(MemoryGraphStore::new());
        let episode = Episode::new("paris is the capital of france", Utc::now());
        let uuid = episode.uuid;
        let extraction = Extraction {
            entities: vec![
                ExtractedEntity {
                    name: "paris".into(),
                    entity_type: "place".into(),
                    summary: Some("capital city of france".into()),
                },
                ExtractedEntity {
                    name: "france".into(),
                    entity_type: "country".into(),
                    summary: None,
                },
            ],
            relations: vec![ExtractedRelation {
                from: "paris".into(),
                to: "france".into(),
                relation_type: "capital_of".into(),
                weight: 0.95,
                context: "geography".into(),
            }],
        };
        store.ingest(build_batch(episode, &extraction).unwrap()).await.unwrap();

        let noise = Episode::new("the borrow checker rejects aliased mutability", Utc::now());
        store.ingest(IngestBatch::episode_only(noise)).await.unwrap();
        (store, uuid)
    }

    #[tokio::test]
    async fn test_round_trip_finds_ingested_episode() {
        let (store, uuid) = seeded().await;
        let engine = engine(store);
        let results = engine.search("capital of france", 5, 0.0).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].uuid, uuid);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let (store, _) = seeded().await;
        let engine = engine(store);
        let first = engine.search("capital of france", 10, 0.0).await.unwrap();
        let second = engine.search("capital of france", 10, 0.0).await.unwrap();
        let ids: Vec<_> = first.iter().map(|r| (r.uuid, r.score.to_bits())).collect();
        let ids2: Vec<_> = second.iter().map(|r| (r.uuid, r.score.to_bits())).collect();
        assert_eq!(ids, ids2);
    }

    #[tokio::test]
    async fn test_min_relevance_excludes_low_scores() {
        let (store, _) = seeded().await;
        let engine = engine(store);
        let results = engine.search("capital of france", 10, 0.4).await.unwrap();
        assert!(results.iter().all(|r| r.score >= 0.4));
    }

    #[tokio::test]
    async fn test_entity_type_filter_applies_before_ranking() {
        let (store, _) = seeded().await;
        let engine = engine(store);
        let places = engine
            .search_entities("capital", Some("place"), 10)
            .await
            .unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "paris");

        let countries = engine
            .search_entities("capital", Some("country"), 10)
            .await
            .unwrap();
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].name, "france");
    }

    #[tokio::test]
    async fn test_graph_proximity_boosts_connected_episode() {
        let (store, _) = seeded().await;
        // "france" names an entity; the paris episode's entities are all in
        // the query neighborhood while the noise episode has none.
        let engine = engine(store);
        let results = engine.search("france", 10, 0.0).await.unwrap();
        assert_eq!(results[0].content, "paris is the capital of france");
    }

    #[test]
    fn test_cap_applies_after_filter() {
        // 20 scores spanning [0.1, 0.9] step 0.042; min 0.5 then cap 3 must
        // yield the top 3 of those >= 0.5, not the overall top 3 filtered.
        let t0 = Utc::now();
        let results: Vec<ScoredResult> = (0..20)
            .map(|i| ScoredResult {
                uuid: Uuid::new_v4(),
                name: format!("ep{}", i),
                content: String::new(),
                score: 0.1 + 0.8 * (i as f64 / 19.0),
                reference_time: t0 - Duration::seconds(i),
                group_id: None,
            })
            .collect();

        let ranked = rank(results, 0.5, 3);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.score >= 0.5));
        assert!(ranked[0].score >= ranked[1].score && ranked[1].score >= ranked[2].score);
        assert!((ranked[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_equal_scores_break_ties_by_recency() {
        let t0 = Utc::now();
        let older = ScoredResult {
            uuid: Uuid::new_v4(),
            name: "older".into(),
            content: String::new(),
            score: 0.7,
            reference_time: t0 - Duration::hours(1),
            group_id: None,
        };
        let newer = ScoredResult {
            uuid: Uuid::new_v4(),
            name: "newer".into(),
            content: String::new(),
            score: 0.7,
            reference_time: t0,
            group_id: None,
        };
        let ranked = rank(vec![older, newer], 0.0, 10);
        assert_eq!(ranked[0].name, "newer");
    }

    proptest! {
        /// Tightening min_relevance never increases the result count.
        #[test]
        fn prop_tighter_filter_never_grows(
            scores in proptest::collection::vec(0.0f64..=1.0, 0..40),
            lo in 0.0f64..=1.0,
            hi in 0.0f64..=1.0,
        ) {
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            let t0 = Utc::now();
            let results: Vec<ScoredResult> = scores
                .iter()
                .enumerate()
                .map(|(i, &score)| ScoredResult {
                    uuid: Uuid::new_v4(),
                    name: format!("ep{}", i),
                    content: String::new(),
                    score,
                    reference_time: t0,
                    group_id: None,
                })
                .collect();

            let loose = rank(results.clone(), lo, usize::MAX);
            let tight = rank(results, hi, usize::MAX);
            prop_assert!(tight.len() <= loose.len());
            prop_assert!(tight.iter().all(|r| r.score >= hi));
        }
    }
}
