//! Configuration loading
//!
//! Configuration is load-once, pre-traffic: a missing or malformed file is
//! a fatal [`MemoryError::Config`], with no recovery path.

use std::path::Path;

use serde::{Deserialize, Serialize};

use engram_core::{MemoryError, Result};
use engram_search::SearchWeights;

/// Backend connection coordinates, consumed by graph-DB backends behind
/// [`GraphBackend`](engram_store::GraphBackend). The in-memory reference
/// backend records them but needs no connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "neo4j".to_string()
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngramConfig {
    pub graph: GraphConfig,
    /// Per-operation timeout for backend/extractor/embedder calls
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Hybrid search signal weights
    #[serde(default)]
    pub search: SearchWeights,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl EngramConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MemoryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            MemoryError::Config(format!("malformed {}: {}", path.display(), e))
        })?;
        config
            .search
            .check()
            .map_err(|e| MemoryError::Config(e.to_string()))?;
        Ok(config)
    }
}
