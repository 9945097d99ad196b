//! Graph commands: relations, snapshot, stats

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use engram_client::client::DEFAULT_MAX_DEPTH;
use engram_client::MemoryClient;
use engram_proto::{format_relations_response, format_snapshot_response};

#[derive(Args)]
pub struct RelationsArgs {
    /// Entity name
    pub entity: String,

    /// Minimum relation weight (0-1)
    #[arg(long, default_value_t = 0.3)]
    pub min_weight: f64,

    /// Traversal depth in hops
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,
}

pub async fn relations(client: &MemoryClient, args: RelationsArgs) -> Result<()> {
    let relations = client
        .get_entity_relations(&args.entity, args.min_weight, args.depth)
        .await?;
    println!("{}", format_relations_response(&args.entity, &relations));
    Ok(())
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Entity name
    pub entity: String,

    /// Instant to reconstruct, RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

pub async fn snapshot(client: &MemoryClient, args: SnapshotArgs) -> Result<()> {
    let at: DateTime<Utc> = match &args.at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("'{}' is not an RFC 3339 timestamp", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let snapshot = client.snapshot(&args.entity, at).await?;
    println!("{}", format_snapshot_response(&snapshot));
    Ok(())
}

#[derive(Args)]
pub struct StatsArgs {}

pub async fn stats(client: &MemoryClient, _args: StatsArgs) -> Result<()> {
    let stats = client.stats().await?;
    println!("{}", stats);
    Ok(())
}
