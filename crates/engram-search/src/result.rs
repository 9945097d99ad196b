//! Typed query results
//!
//! Field presence is decided once, where results are produced;
//! consumers never probe for maybe-missing attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ranked episode hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Episode uuid
    pub uuid: Uuid,
    /// Episode name
    pub name: String,
    /// Full episode content
    pub content: String,
    /// Combined relevance in [0,1]
    pub score: f64,
    /// Caller-supplied event time, used for recency tie-breaks
    pub reference_time: DateTime<Utc>,
    /// Conversation correlator, when the episode carried one
    pub group_id: Option<String>,
}

/// One ranked entity hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityHit {
    /// Entity name
    pub name: String,
    /// Entity type label
    pub entity_type: String,
    /// Summary, when the extractor produced one
    pub summary: Option<String>,
    /// When the winning version was created
    pub created_at: DateTime<Utc>,
    /// Combined relevance in [0,1]
    pub score: f64,
}
