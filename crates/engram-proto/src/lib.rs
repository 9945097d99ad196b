//! # Engram Proto
//!
//! CSP/1, the line-oriented response grammar exposed to callers:
//!
//! ```text
//! STATUS {OK|FAIL}
//! SCOPE [tag1,tag2,...]
//! DATA <token>
//! [RELEVANCE s1,s2,...]
//! [RATIONALE <free text>]
//! [SNIPPET <uuid>:"<...>"]
//! [LINKS a<->b:w,...]
//! ```
//!
//! Field order is fixed and rendering is byte-for-byte reproducible for
//! identical ranked inputs: scope tags are collected in first-seen order
//! with explicit dedup, never from an unordered set.

pub mod response;
pub mod scope;

pub use response::{
    format_episode_ack, format_error_response, format_relations_response,
    format_search_response, format_snapshot_response, CspResponse, Status,
};
pub use scope::scope_tags;
