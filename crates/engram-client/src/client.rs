//! The caller-owned memory client

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use engram_core::{Episode, GraphStats, MemoryError, Relation, Result};
use engram_extract::{Embedder, Extractor, HashEmbedder, NoopExtractor};
use engram_search::{EntityHit, ScoredResult, SearchEngine, SearchWeights};
use engram_store::{
    build_batch, GraphBackend, MemoryGraphStore, RelationWalker, Snapshot, TemporalIndex,
};

use crate::config::EngramConfig;

/// Default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default traversal depth: direct relations only.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Parameters for [`MemoryClient::add_episode`]. Only `content` is
/// required; everything else has the documented defaults.
#[derive(Debug, Clone)]
pub struct EpisodeParams {
    pub content: String,
    /// Defaults to `episode_<YYYYMMDD_HHMMSS>` derived from the reference time
    pub name: Option<String>,
    /// Defaults to "agent conversation"
    pub source_description: Option<String>,
    /// Defaults to now
    pub reference_time: Option<DateTime<Utc>>,
    pub group_id: Option<String>,
}

impl EpisodeParams {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            name: None,
            source_description: None,
            reference_time: None,
            group_id: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_source(mut self, source_description: &str) -> Self {
        self.source_description = Some(source_description.to_string());
        self
    }

    pub fn at(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn in_group(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }
}

/// Builder for [`MemoryClient`].
pub struct MemoryClientBuilder {
    backend: Option<Arc<dyn GraphBackend>>,
    extractor: Arc<dyn Extractor>,
    embedder: Arc<dyn Embedder>,
    weights: SearchWeights,
    timeout: Duration,
}

impl Default for MemoryClientBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            extractor: Arc::new(NoopExtractor),
            embedder: Arc::new(HashEmbedder::default()),
            weights: SearchWeights::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl MemoryClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Arc<dyn GraphBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn weights(mut self, weights: SearchWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<MemoryClient> {
        self.weights.check()?;
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryGraphStore::new()));
        let engine = SearchEngine::new(Arc::clone(&backend), Arc::clone(&self.embedder))
            .with_weights(self.weights)?;
        Ok(MemoryClient {
            index: TemporalIndex::new(Arc::clone(&backend)),
            walker: RelationWalker::new(Arc::clone(&backend)),
            engine,
            extractor: self.extractor,
            backend,
            timeout: self.timeout,
            closed: AtomicBool::new(false),
            gate: RwLock::new(()),
        })
    }
}

/// High-level client for the episodic graph memory.
///
/// Cheap operations share the backend concurrently; `close` waits for
/// in-flight operations before releasing it and is idempotent.
#[derive(Debug)]
pub struct MemoryClient {
    backend: Arc<dyn GraphBackend>,
    extractor: Arc<dyn Extractor>,
    engine: SearchEngine<dyn GraphBackend>,
    index: TemporalIndex<dyn GraphBackend>,
    walker: RelationWalker<dyn GraphBackend>,
    timeout: Duration,
    closed: AtomicBool,
    gate: RwLock<()>,
}

impl MemoryClient {
    pub fn builder() -> MemoryClientBuilder {
        MemoryClientBuilder::new()
    }

    /// Build a client from loaded configuration.
    ///
    /// Backend coordinates are logged (never the password) and handed to
    /// the backend; the in-memory reference backend needs no connection.
    pub async fn connect(config: &EngramConfig) -> Result<Self> {
        tracing::info!(
            uri = %config.graph.uri,
            user = %config.graph.user,
            database = %config.graph.database,
            "Initializing graph backend"
        );
        Self::builder()
            .weights(config.search)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
    }

    /// Append one episode and apply its extraction to the graph.
    ///
    /// Extraction runs first; the episode, its entity versions, its
    /// relation transitions, and the provenance links then commit as one
    /// atomic batch. A failed or timed-out extractor leaves nothing
    /// written. Returns the fresh episode uuid.
    pub async fn add_episode(&self, params: EpisodeParams) -> Result<Uuid> {
        let _in_flight = self.begin("add_episode").await?;

        let reference_time = params.reference_time.unwrap_or_else(Utc::now);
        let mut episode = Episode::new(&params.content, reference_time);
        if let Some(name) = &params.name {
            episode = episode.with_name(name);
        }
        if let Some(source) = &params.source_description {
            episode = episode.with_source(source);
        }
        if let Some(group) = &params.group_id {
            episode = episode.with_group(group);
        }
        let uuid = episode.uuid;

        let extraction = self
            .with_timeout("extract", self.extractor.extract(&params.content))
            .await?;
        let batch = build_batch(episode, &extraction)?;
        self.with_timeout("ingest", self.backend.ingest(batch)).await?;

        tracing::info!(
            episode = %uuid,
            entities = extraction.entities.len(),
            relations = extraction.relations.len(),
            "Episode stored"
        );
        Ok(uuid)
    }

    /// Hybrid search over episodes. Results below `min_relevance` are
    /// dropped before the `max_results` cap applies.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        min_relevance: f64,
    ) -> Result<Vec<ScoredResult>> {
        let _in_flight = self.begin("search").await?;
        self.with_timeout("search", self.engine.search(query, max_results, min_relevance))
            .await
    }

    /// Entity search with an optional pre-ranking type filter.
    pub async fn search_entities(
        &self,
        query: &str,
        entity_type: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<EntityHit>> {
        let _in_flight = self.begin("search_entities").await?;
        self.with_timeout(
            "search_entities",
            self.engine.search_entities(query, entity_type, max_results),
        )
        .await
    }

    /// Currently-valid relations reachable from `entity_name` within
    /// `max_depth` hops, weight-filtered. Empty for unknown entities.
    pub async fn get_entity_relations(
        &self,
        entity_name: &str,
        min_weight: f64,
        max_depth: usize,
    ) -> Result<Vec<Relation>> {
        let _in_flight = self.begin("get_entity_relations").await?;
        self.with_timeout(
            "get_entity_relations",
            self.walker.traverse(entity_name, min_weight, max_depth),
        )
        .await
    }

    /// The state of an entity and its relations as of `at`.
    pub async fn snapshot(&self, entity_name: &str, at: DateTime<Utc>) -> Result<Snapshot> {
        let _in_flight = self.begin("snapshot").await?;
        self.with_timeout("snapshot", self.index.snapshot(entity_name, at))
            .await
    }

    /// Aggregate store counts.
    pub async fn stats(&self) -> Result<GraphStats> {
        let _in_flight = self.begin("stats").await?;
        self.with_timeout("stats", self.backend.stats()).await
    }

    /// Close the client: reject new operations, wait for in-flight ones,
    /// then release the backend. Calling close twice is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // New operations are rejected by the flag; acquiring the write half
        // waits for every in-flight read guard to drop.
        let _drained = self.gate.write().await;
        tracing::info!("Memory client closed");
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn begin(&self, op: &str) -> Result<tokio::sync::RwLockReadGuard<'_, ()>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MemoryError::unavailable(op, "client is closed"));
        }
        Ok(self.gate.read().await)
    }

    async fn with_timeout<T, E, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        MemoryError: From<E>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(inner) => inner.map_err(MemoryError::from),
            Err(_) => Err(MemoryError::timeout(op, self.timeout.as_millis() as u64)),
        }
    }
}
