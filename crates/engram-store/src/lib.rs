//! # Engram Store
//!
//! The episodic graph store:
//! - [`GraphBackend`] — pluggable storage trait with atomic ingest batches
//! - [`MemoryGraphStore`] — in-memory reference backend
//! - [`TemporalIndex`] — point-in-time ("as-of") reconstruction
//! - [`RelationWalker`] — breadth-first traversal of currently-valid edges
//!
//! Episodes are append-only. Entities and relations are bi-temporally
//! versioned: a contradicted relation is closed and a new version opened,
//! never overwritten.

pub mod apply;
pub mod backend;
pub mod memory;
pub mod temporal;
pub mod traverse;

pub use apply::build_batch;
pub use backend::{GraphBackend, IngestBatch, UpsertOutcome};
pub use memory::MemoryGraphStore;
pub use temporal::{Snapshot, TemporalIndex};
pub use traverse::RelationWalker;
