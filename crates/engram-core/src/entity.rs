//! Entity nodes with bi-temporal validity
//!
//! Multiple temporal versions of the same logical entity may coexist as
//! distinct records sharing a name; validity intervals tell them apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// A named node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name. Not globally unique; disambiguation is external.
    pub name: String,
    /// Entity type label (e.g. "person", "place")
    pub entity_type: String,
    /// Short summary, when the extractor produced one
    pub summary: Option<String>,
    /// When this record was created
    pub created_at: DateTime<Utc>,
    /// Start of real-world validity
    pub valid_from: DateTime<Utc>,
    /// End of real-world validity. `None` means "still valid".
    pub valid_to: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create an open-ended entity version valid from `valid_from`.
    pub fn new(name: &str, entity_type: &str, valid_from: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            summary: None,
            created_at: Utc::now(),
            valid_from,
            valid_to: None,
        }
    }

    /// Attach a summary.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Whether this version was valid at `ts`: `valid_from <= ts` and
    /// `valid_to` is unset or strictly after `ts`.
    pub fn is_valid_at(&self, ts: DateTime<Utc>) -> bool {
        self.valid_from <= ts && self.valid_to.map_or(true, |end| end > ts)
    }

    /// Whether this version is still open-ended.
    pub fn is_currently_valid(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Reject inverted validity intervals.
    pub fn check_interval(&self) -> Result<()> {
        if let Some(end) = self.valid_to {
            if self.valid_from > end {
                return Err(MemoryError::Validation(format!(
                    "entity '{}' has valid_from {} after valid_to {}",
                    self.name, self.valid_from, end
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_half_open_validity() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::hours(1);
        let mut entity = Entity::new("paris", "place", t1);
        entity.valid_to = Some(t2);

        // Valid on [t1, t2): inclusive start, exclusive end.
        assert!(entity.is_valid_at(t1));
        assert!(entity.is_valid_at(t2 - Duration::seconds(1)));
        assert!(!entity.is_valid_at(t2));
        assert!(!entity.is_valid_at(t1 - Duration::seconds(1)));
    }

    #[test]
    fn test_open_ended_version_always_valid_after_start() {
        let t1 = Utc::now();
        let entity = Entity::new("paris", "place", t1);
        assert!(entity.is_currently_valid());
        assert!(entity.is_valid_at(t1 + Duration::weeks(100)));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let t1 = Utc::now();
        let mut entity = Entity::new("paris", "place", t1);
        entity.valid_to = Some(t1 - Duration::seconds(1));
        assert!(entity.check_interval().is_err());
    }
}
