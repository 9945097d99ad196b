//! Episode and entity commands: add, search, entities

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use engram_client::{EpisodeParams, MemoryClient};
use engram_proto::{format_episode_ack, format_search_response};

#[derive(Args)]
pub struct AddArgs {
    /// Episode content
    pub content: String,

    /// Episode name (derived from the reference time if omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Source description
    #[arg(long)]
    pub source: Option<String>,

    /// Conversation/thread correlator
    #[arg(long)]
    pub group: Option<String>,
}

pub async fn add(client: &MemoryClient, args: AddArgs) -> Result<()> {
    let mut params = EpisodeParams::new(&args.content);
    if let Some(name) = &args.name {
        params = params.with_name(name);
    }
    if let Some(source) = &args.source {
        params = params.with_source(source);
    }
    if let Some(group) = &args.group {
        params = params.in_group(group);
    }

    let uuid = client.add_episode(params).await?;
    println!("{}", format_episode_ack(uuid));
    Ok(())
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum number of results
    #[arg(long, default_value_t = 10)]
    pub max_results: usize,

    /// Minimum relevance score (0-1), applied before the cap
    #[arg(long, default_value_t = 0.3)]
    pub min_relevance: f64,
}

pub async fn search(client: &MemoryClient, args: SearchArgs) -> Result<()> {
    let results = client
        .search(&args.query, args.max_results, args.min_relevance)
        .await?;
    println!("{}", format_search_response(&results));
    Ok(())
}

#[derive(Args)]
pub struct EntitiesArgs {
    /// Search query
    pub query: String,

    /// Only return entities of this type
    #[arg(long)]
    pub entity_type: Option<String>,

    /// Maximum number of results
    #[arg(long, default_value_t = 10)]
    pub max_results: usize,
}

pub async fn entities(client: &MemoryClient, args: EntitiesArgs) -> Result<()> {
    let hits = client
        .search_entities(&args.query, args.entity_type.as_deref(), args.max_results)
        .await?;

    if hits.is_empty() {
        println!("{}", "no entities matched".dimmed());
        return Ok(());
    }
    for hit in hits {
        let summary = hit.summary.as_deref().unwrap_or("-");
        println!(
            "{:.2}  {} {}  {}",
            hit.score,
            hit.name.bold(),
            format!("({})", hit.entity_type).dimmed(),
            summary
        );
    }
    Ok(())
}
