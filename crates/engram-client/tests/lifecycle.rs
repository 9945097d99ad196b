//! Full client lifecycle integration tests
//!
//! Exercises the complete flow: configure -> ingest -> search -> traverse
//! -> close, plus the concurrency and timeout contracts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use engram_client::{shared_client, EngramConfig, EpisodeParams, GraphConfig, MemoryClient};
use engram_core::MemoryError;
use engram_extract::{
    ExtractError, ExtractedEntity, ExtractedRelation, Extraction, Extractor, MockExtractor,
};
use engram_proto::format_search_response;
use engram_search::SearchWeights;

fn paris_extraction() -> Extraction {
    Extraction {
        entities: vec![
            ExtractedEntity {
                name: "paris".into(),
                entity_type: "place".into(),
                summary: Some("capital of france".into()),
            },
            ExtractedEntity {
                name: "france".into(),
                entity_type: "country".into(),
                summary: None,
            },
        ],
        relations: vec![ExtractedRelation {
            from: "paris".into(),
            to: "france".into(),
            relation_type: "capital_of".into(),
            weight: 0.95,
            context: "geography".into(),
        }],
    }
}

/// An extractor that takes its time, for timeout and close-drain tests.
#[derive(Debug)]
struct SlowExtractor {
    delay: Duration,
}

#[async_trait]
impl Extractor for SlowExtractor {
    fn name(&self) -> &str {
        "slow"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, _content: &str) -> Result<Extraction, ExtractError> {
        tokio::time::sleep(self.delay).await;
        Ok(Extraction::default())
    }
}

#[tokio::test]
async fn test_round_trip_add_then_search() {
    let client = MemoryClient::builder()
        .extractor(Arc::new(MockExtractor::constant(paris_extraction())))
        .build()
        .unwrap();

    let uuid = client
        .add_episode(EpisodeParams::new("paris is the capital of france"))
        .await
        .unwrap();

    let results = client.search("capital of france", 5, 0.0).await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].uuid, uuid);

    // The extraction became traversable graph state.
    let relations = client.get_entity_relations("paris", 0.0, 1).await.unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].to_entity, "france");
}

#[tokio::test]
async fn test_empty_search_renders_literal_fail() {
    let client = MemoryClient::builder().build().unwrap();
    let results = client.search("zzz_no_such_token_xyz", 10, 0.0).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(
        format_search_response(&results),
        "STATUS FAIL\nSCOPE []\nDATA none\nRATIONALE No results found"
    );
}

#[tokio::test]
async fn test_failed_extractor_leaves_no_state() {
    let client = MemoryClient::builder()
        .extractor(Arc::new(MockExtractor::unavailable("connection refused")))
        .build()
        .unwrap();

    let err = client
        .add_episode(EpisodeParams::new("never stored"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.episodes, 0);
    assert_eq!(stats.entity_versions, 0);
}

#[tokio::test]
async fn test_extractor_timeout_is_retryable_and_writes_nothing() {
    let client = MemoryClient::builder()
        .extractor(Arc::new(SlowExtractor {
            delay: Duration::from_millis(500),
        }))
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let err = client
        .add_episode(EpisodeParams::new("too slow"))
        .await
        .unwrap_err();
    match &err {
        MemoryError::BackendUnavailable { op, reason } => {
            assert_eq!(op, "extract");
            assert!(reason.contains("20ms"));
        }
        other => panic!("expected BackendUnavailable, got {:?}", other),
    }

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.episodes, 0);
}

#[tokio::test]
async fn test_bad_extractor_weight_rejected_before_commit() {
    let extraction = Extraction {
        entities: vec![ExtractedEntity {
            name: "a".into(),
            entity_type: "thing".into(),
            summary: None,
        }],
        relations: vec![ExtractedRelation {
            from: "a".into(),
            to: "a".into(),
            relation_type: "self".into(),
            weight: 1.5,
            context: String::new(),
        }],
    };
    let client = MemoryClient::builder()
        .extractor(Arc::new(MockExtractor::constant(extraction)))
        .build()
        .unwrap();

    let err = client
        .add_episode(EpisodeParams::new("overweight"))
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.episodes, 0);
}

#[tokio::test]
async fn test_concurrent_ingest_commits_everything_once() {
    let client = Arc::new(MemoryClient::builder().build().unwrap());

    let mut handles = Vec::new();
    for i in 0..10 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client
                .add_episode(EpisodeParams::new(&format!("event {}", i)))
                .await
        }));
    }

    let mut uuids = std::collections::HashSet::new();
    for handle in handles {
        let uuid = handle.await.unwrap().unwrap();
        assert!(uuids.insert(uuid), "uuid issued twice");
    }

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.episodes, 10);
}

#[tokio::test]
async fn test_close_drains_in_flight_operations() {
    let client = Arc::new(
        MemoryClient::builder()
            .extractor(Arc::new(SlowExtractor {
                delay: Duration::from_millis(100),
            }))
            .build()
            .unwrap(),
    );

    let worker = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.add_episode(EpisodeParams::new("in flight")).await })
    };

    // Let the operation take its read guard before closing.
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.close().await;

    // The in-flight operation finished rather than being torn down.
    assert!(worker.await.unwrap().is_ok());

    // New operations are rejected, and closing again is a no-op.
    assert!(client.stats().await.is_err());
    client.close().await;
}

#[tokio::test]
async fn test_shared_client_initializes_exactly_once() {
    let config = EngramConfig {
        graph: GraphConfig {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "secret".into(),
            database: "neo4j".into(),
        },
        timeout_ms: 1_000,
        search: SearchWeights::default(),
    };

    let (a, b) = tokio::join!(shared_client(&config), shared_client(&config));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
}
