//! Breadth-first traversal of currently-valid relations

use std::collections::BTreeSet;
use std::sync::Arc;

use engram_core::{Relation, RelationKey, Result};

use crate::backend::GraphBackend;

/// Breadth-first walker over the currently-valid relation graph.
#[derive(Debug)]
pub struct RelationWalker<B: GraphBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: GraphBackend + ?Sized> RelationWalker<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Relations reachable from `entity_name` within `max_depth` hops.
    ///
    /// Expands only currently-valid relations with `weight >= min_weight`.
    /// Output order: hop by hop (direct relations first), descending weight
    /// within a hop, lexicographic endpoints on equal weight. An unknown
    /// entity (or a deployment whose extractor never produced relations)
    /// yields an empty sequence, not an error.
    pub async fn traverse(
        &self,
        entity_name: &str,
        min_weight: f64,
        max_depth: usize,
    ) -> Result<Vec<Relation>> {
        let mut collected: Vec<Relation> = Vec::new();
        let mut emitted: BTreeSet<RelationKey> = BTreeSet::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut frontier: Vec<String> = vec![entity_name.to_string()];
        visited.insert(entity_name.to_string());

        for hop in 0..max_depth {
            let mut hop_relations: Vec<Relation> = Vec::new();
            for node in &frontier {
                for relation in self.backend.relations_of(node).await? {
                    if !relation.is_currently_valid() || relation.weight < min_weight {
                        continue;
                    }
                    let key = relation.key();
                    if emitted.contains(&key) {
                        continue;
                    }
                    emitted.insert(key);
                    hop_relations.push(relation);
                }
            }

            if hop_relations.is_empty() {
                break;
            }

            hop_relations.sort_by(|a, b| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.from_entity.cmp(&b.from_entity))
                    .then_with(|| a.to_entity.cmp(&b.to_entity))
                    .then_with(|| a.relation_type.cmp(&b.relation_type))
            });

            let mut next_frontier: Vec<String> = Vec::new();
            for relation in &hop_relations {
                for node in &frontier {
                    if let Some(other) = relation.other_endpoint(node) {
                        if visited.insert(other.to_string()) {
                            next_frontier.push(other.to_string());
                        }
                    }
                }
            }

            tracing::debug!(
                entity = %entity_name,
                hop,
                found = hop_relations.len(),
                "Traversal hop complete"
            );
            collected.extend(hop_relations);
            frontier = next_frontier;
        }

        Ok(collected)
    }
}
