//! # Engram Client
//!
//! The caller-owned handle to the memory service:
//! - [`EngramConfig`] — JSON configuration, fail-fast at startup
//! - [`MemoryClient`] — ingest, search, traversal, snapshot, stats, close
//! - [`shared_client`] — explicit, guarded process-wide instance
//!
//! Every operation that touches the backend, extractor, or embedder runs
//! under the configured timeout and fails retryably with no partial state.

pub mod client;
pub mod config;
pub mod shared;

pub use client::{EpisodeParams, MemoryClient, MemoryClientBuilder};
pub use config::{EngramConfig, GraphConfig};
pub use shared::{close_shared, shared_client};
