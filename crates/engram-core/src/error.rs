//! Error kinds surfaced to callers of the memory service

use thiserror::Error;

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Caller-facing error kinds.
///
/// Absence of data (unknown entity, empty snapshot, no search hits) is
/// modeled as `Option`/empty `Vec` results, never as an error, so it cannot
/// be mistaken for [`MemoryError::BackendUnavailable`].
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Missing or malformed configuration. Fatal at startup, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph store, extractor, or embedder unreachable or timed out.
    /// Retryable by the caller; the service does not retry internally.
    #[error("Backend unavailable during {op}: {reason}")]
    BackendUnavailable { op: String, reason: String },

    /// Episode append failed mid-transaction. No partial episode is visible.
    #[error("Ingest failed: {0}")]
    Ingest(String),

    /// Input rejected before commit (weight out of bounds, inverted
    /// validity interval, unknown endpoint). Never silently coerced.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl MemoryError {
    /// Backend timeout with the attempted operation and the timeout used,
    /// so the caller has what it needs to decide on a retry.
    pub fn timeout(op: &str, timeout_ms: u64) -> Self {
        Self::BackendUnavailable {
            op: op.to_string(),
            reason: format!("timed out after {}ms", timeout_ms),
        }
    }

    /// Backend unreachable for a non-timeout reason.
    pub fn unavailable(op: &str, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            op: op.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_carries_op_and_duration() {
        let err = MemoryError::timeout("search", 250);
        let msg = err.to_string();
        assert!(msg.contains("search"));
        assert!(msg.contains("250ms"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_only_backend_errors_are_retryable() {
        assert!(!MemoryError::Config("missing file".into()).is_retryable());
        assert!(!MemoryError::Validation("weight 1.5".into()).is_retryable());
        assert!(!MemoryError::Ingest("aborted".into()).is_retryable());
    }
}
