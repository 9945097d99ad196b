//! Weighted, typed, bi-temporally versioned edges
//!
//! A contradicted relation is never overwritten: the old version is closed
//! (`valid_to` and `invalidated_at` set) and a new version opened, so the
//! full history stays reconstructable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// A weighted, typed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity name
    pub from_entity: String,
    /// Target entity name
    pub to_entity: String,
    /// Relation type label (e.g. "knows", "capital_of")
    pub relation_type: String,
    /// Strength in [0,1]. Out-of-range values are rejected, never clamped.
    pub weight: f64,
    /// Short free-text context for the relation
    pub context: String,
    /// Start of real-world validity
    pub valid_from: DateTime<Utc>,
    /// End of real-world validity. `None` means "still valid".
    pub valid_to: Option<DateTime<Utc>>,
    /// When this version was superseded by a newer one, if ever
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl Relation {
    /// Create an open-ended relation version.
    ///
    /// Rejects `weight` outside `[0,1]` with [`MemoryError::Validation`];
    /// callers relying on clamping must clamp themselves first.
    pub fn new(
        from_entity: &str,
        to_entity: &str,
        relation_type: &str,
        weight: f64,
        context: &str,
        valid_from: DateTime<Utc>,
    ) -> Result<Self> {
        check_weight(weight)?;
        Ok(Self {
            from_entity: from_entity.to_string(),
            to_entity: to_entity.to_string(),
            relation_type: relation_type.to_string(),
            weight,
            context: context.to_string(),
            valid_from,
            valid_to: None,
            invalidated_at: None,
        })
    }

    /// The logical identity of this relation, shared by all its versions.
    pub fn key(&self) -> RelationKey {
        RelationKey {
            from_entity: self.from_entity.clone(),
            to_entity: self.to_entity.clone(),
            relation_type: self.relation_type.clone(),
        }
    }

    /// Whether this version was valid at `ts` (half-open interval).
    pub fn is_valid_at(&self, ts: DateTime<Utc>) -> bool {
        self.valid_from <= ts && self.valid_to.map_or(true, |end| end > ts)
    }

    /// Whether this version is still open-ended.
    pub fn is_currently_valid(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Name of the endpoint opposite `entity`, if `entity` is an endpoint.
    pub fn other_endpoint(&self, entity: &str) -> Option<&str> {
        if self.from_entity == entity {
            Some(&self.to_entity)
        } else if self.to_entity == entity {
            Some(&self.from_entity)
        } else {
            None
        }
    }

    /// Reject inverted validity intervals.
    pub fn check_interval(&self) -> Result<()> {
        if let Some(end) = self.valid_to {
            if self.valid_from > end {
                return Err(MemoryError::Validation(format!(
                    "relation {}->{} has valid_from {} after valid_to {}",
                    self.from_entity, self.to_entity, self.valid_from, end
                )));
            }
        }
        Ok(())
    }
}

/// Logical relation identity: `(from, to, type)`.
///
/// Ordered so relation tables can live in `BTreeMap`s and iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    pub from_entity: String,
    pub to_entity: String,
    pub relation_type: String,
}

/// Reject weights outside `[0,1]`.
pub fn check_weight(weight: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(MemoryError::Validation(format!(
            "relation weight {} outside [0,1]",
            weight
        )));
    }
    Ok(())
}
