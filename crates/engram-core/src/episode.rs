//! Immutable episode records for the append-only log
//!
//! An [`Episode`] is never edited after it is stored; the log is
//! append-only and re-ingesting identical content produces a new episode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default provenance label when the caller supplies none.
pub const DEFAULT_SOURCE: &str = "agent conversation";

/// An immutable, timestamped unit of ingested raw text with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier, assigned exactly once at creation
    pub uuid: Uuid,
    /// Human-readable name. Not a key; collisions are permitted.
    pub name: String,
    /// Raw text content
    pub content: String,
    /// Description of where the text came from
    pub source_description: String,
    /// Caller-supplied event time
    pub reference_time: DateTime<Utc>,
    /// System clock at insert. Stamped by the store at commit time.
    pub ingestion_time: DateTime<Utc>,
    /// Optional thread/conversation correlator
    pub group_id: Option<String>,
}

impl Episode {
    /// Create a new episode with a fresh uuid.
    ///
    /// The name is derived from `reference_time` unless overridden with
    /// [`Episode::with_name`]. `ingestion_time` is provisional here; the
    /// store re-stamps it when the episode is committed.
    pub fn new(content: &str, reference_time: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: derived_name(reference_time),
            content: content.to_string(),
            source_description: DEFAULT_SOURCE.to_string(),
            reference_time,
            ingestion_time: Utc::now(),
            group_id: None,
        }
    }

    /// Override the derived name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the provenance description.
    pub fn with_source(mut self, source_description: &str) -> Self {
        self.source_description = source_description.to_string();
        self
    }

    /// Attach a conversation/thread correlator.
    pub fn with_group(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }
}

/// Derive a deterministic episode name from its reference time,
/// e.g. `episode_20260805_142233`.
pub fn derived_name(reference_time: DateTime<Utc>) -> String {
    format!("episode_{}", reference_time.format("%Y%m%d_%H%M%S"))
}
