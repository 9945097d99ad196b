//! Extractor trait and extraction result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use engram_core::MemoryError;

/// Errors from extraction/embedding providers
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Extraction failed: {0}")]
    Failed(String),
    #[error("Invalid provider output: {0}")]
    InvalidOutput(String),
}

impl From<ExtractError> for MemoryError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Unavailable(reason) => MemoryError::unavailable("extraction", reason),
            ExtractError::Failed(reason) => MemoryError::unavailable("extraction", reason),
            ExtractError::InvalidOutput(reason) => MemoryError::Validation(reason),
        }
    }
}

/// An entity tuple as produced by an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    pub summary: Option<String>,
}

/// A relation tuple as produced by an extractor.
///
/// The weight is the provider's claim; the store validates it against
/// `[0,1]` before anything is committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelation {
    pub from: String,
    pub to: String,
    pub relation_type: String,
    pub weight: f64,
    pub context: String,
}

/// Everything an extractor found in one episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<ExtractedEntity>,
    pub relations: Vec<ExtractedRelation>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// Trait for entity/relation extraction providers.
///
/// Implementations typically call an LLM or NLP service; extraction quality
/// is their concern, not the store's.
#[async_trait]
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Extract entities and relations from episode content
    async fn extract(&self, content: &str) -> Result<Extraction, ExtractError>;
}
