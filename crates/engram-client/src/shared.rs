//! Explicit process-wide shared client
//!
//! One guarded cell instead of implicit module state: concurrent first use
//! initializes exactly once, and the handle stays visible to every caller
//! that asks for it afterwards.

use std::sync::Arc;

use tokio::sync::OnceCell;

use engram_core::Result;

use crate::client::MemoryClient;
use crate::config::EngramConfig;

static SHARED: OnceCell<Arc<MemoryClient>> = OnceCell::const_new();

/// Get the process-wide client, initializing it from `config` on first
/// use. Concurrent callers race safely: exactly one backend is created,
/// the rest wait and receive the same handle. Later calls ignore their
/// `config` argument; the first initialization wins.
pub async fn shared_client(config: &EngramConfig) -> Result<Arc<MemoryClient>> {
    SHARED
        .get_or_try_init(|| async {
            let client = MemoryClient::connect(config).await?;
            Ok(Arc::new(client))
        })
        .await
        .map(Arc::clone)
}

/// Close the shared client if it was ever initialized. Idempotent, like
/// [`MemoryClient::close`]; callers still holding the handle see their
/// in-flight operations finish and subsequent ones rejected.
pub async fn close_shared() {
    if let Some(client) = SHARED.get() {
        client.close().await;
    }
}
