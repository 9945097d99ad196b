//! Mock extraction providers for testing

use async_trait::async_trait;

use crate::extractor::{ExtractError, Extraction, Extractor};

/// An extractor that never finds anything.
///
/// Deployments without an extraction backend use this; traversal and
/// snapshot queries then legitimately return empty results.
#[derive(Debug, Default, Clone)]
pub struct NoopExtractor;

#[async_trait]
impl Extractor for NoopExtractor {
    fn name(&self) -> &str {
        "noop"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, _content: &str) -> Result<Extraction, ExtractError> {
        Ok(Extraction::default())
    }
}

/// A mock extractor that returns predefined extractions.
/// Cycles through its canned results, like a scripted NLP backend.
#[derive(Debug)]
pub struct MockExtractor {
    results: Vec<Extraction>,
    index: std::sync::atomic::AtomicUsize,
    fail_with: Option<String>,
}

impl MockExtractor {
    /// Create a mock cycling through the given extractions.
    pub fn new(results: Vec<Extraction>) -> Self {
        Self {
            results,
            index: std::sync::atomic::AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// Create a mock that always returns the same extraction.
    pub fn constant(extraction: Extraction) -> Self {
        Self::new(vec![extraction])
    }

    /// Create a mock that fails every call, for error-path tests.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            results: Vec::new(),
            index: std::sync::atomic::AtomicUsize::new(0),
            fail_with: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.fail_with.is_none()
    }

    async fn extract(&self, _content: &str) -> Result<Extraction, ExtractError> {
        if let Some(reason) = &self.fail_with {
            return Err(ExtractError::Unavailable(reason.clone()));
        }
        if self.results.is_empty() {
            return Ok(Extraction::default());
        }
        let idx = self
            .index
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(self.results[idx % self.results.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ExtractedEntity, ExtractedRelation};

    fn sample() -> Extraction {
        Extraction {
            entities: vec![ExtractedEntity {
                name: "paris".to_string(),
                entity_type: "place".to_string(),
                summary: None,
            }],
            relations: vec![ExtractedRelation {
                from: "paris".to_string(),
                to: "france".to_string(),
                relation_type: "capital_of".to_string(),
                weight: 0.9,
                context: "geography".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_constant_mock_repeats() {
        let mock = MockExtractor::constant(sample());
        let a = mock.extract("anything").await.unwrap();
        let b = mock.extract("anything else").await.unwrap();
        assert_eq!(a.entities[0].name, "paris");
        assert_eq!(b.relations[0].relation_type, "capital_of");
    }

    #[tokio::test]
    async fn test_unavailable_mock_errors() {
        let mock = MockExtractor::unavailable("connection refused");
        assert!(!mock.is_available().await);
        let err = mock.extract("anything").await.unwrap_err();
        assert!(matches!(err, ExtractError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_noop_extractor_is_empty() {
        let noop = NoopExtractor;
        let result = noop.extract("paris is the capital of france").await.unwrap();
        assert!(result.is_empty());
    }
}
