//! Conversion of extractor output into a bi-temporal ingest batch

use engram_core::{Entity, Episode, Relation, Result};
use engram_extract::Extraction;

use crate::backend::IngestBatch;

/// Convert an extraction into versioned records anchored at the episode's
/// `reference_time` (the time the facts were true in the world, not the
/// time they were recorded).
///
/// Validates every relation weight up front, so a misbehaving extractor is
/// rejected with a validation error before anything reaches the store.
pub fn build_batch(episode: Episode, extraction: &Extraction) -> Result<IngestBatch> {
    let anchor = episode.reference_time;

    let entities: Vec<Entity> = extraction
        .entities
        .iter()
        .map(|e| {
            let mut entity = Entity::new(&e.name, &e.entity_type, anchor);
            entity.summary = e.summary.clone();
            entity
        })
        .collect();

    let mut relations: Vec<Relation> = Vec::with_capacity(extraction.relations.len());
    for r in &extraction.relations {
        relations.push(Relation::new(
            &r.from,
            &r.to,
            &r.relation_type,
            r.weight,
            &r.context,
            anchor,
        )?);
    }

    Ok(IngestBatch {
        episode,
        entities,
        relations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engram_core::MemoryError;
    use engram_extract::{ExtractedEntity, ExtractedRelation};

    #[test]
    fn test_records_anchored_at_reference_time() {
        let t = Utc::now() - chrono::Duration::days(3);
        let episode = Episode::new("alice joined acme", t);
        let extraction = Extraction {
            entities: vec![
                ExtractedEntity {
                    name: "alice".into(),
                    entity_type: "person".into(),
                    summary: Some("new hire".into()),
                },
                ExtractedEntity {
                    name: "acme".into(),
                    entity_type: "org".into(),
                    summary: None,
                },
            ],
            relations: vec![ExtractedRelation {
                from: "alice".into(),
                to: "acme".into(),
                relation_type: "works_at".into(),
                weight: 0.8,
                context: "employment".into(),
            }],
        };

        let batch = build_batch(episode, &extraction).unwrap();
        assert!(batch.entities.iter().all(|e| e.valid_from == t));
        assert!(batch.relations.iter().all(|r| r.valid_from == t));
        assert_eq!(batch.entities[0].summary.as_deref(), Some("new hire"));
    }

    #[test]
    fn test_extractor_weight_out_of_bounds_rejected() {
        let episode = Episode::new("bogus", Utc::now());
        let extraction = Extraction {
            entities: vec![],
            relations: vec![ExtractedRelation {
                from: "a".into(),
                to: "b".into(),
                relation_type: "knows".into(),
                weight: 1.5,
                context: String::new(),
            }],
        };
        let err = build_batch(episode, &extraction).unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }
}
