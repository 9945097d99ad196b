//! Engram CLI - episodic graph memory for conversational agents
//!
//! # Usage
//!
//! ```bash
//! # Replay an episode log, then search it
//! engram --replay episodes.jsonl search "capital of france"
//!
//! # Add a single episode and print the CSP/1 acknowledgment
//! engram add "paris is the capital of france" --name geography
//!
//! # Inspect an entity's relations
//! engram --replay episodes.jsonl relations paris --min-weight 0.5
//!
//! # Reconstruct an entity as of an instant
//! engram --replay episodes.jsonl snapshot paris --at 2026-01-01T00:00:00Z
//! ```
//!
//! The replay file is JSON Lines: one episode per line, optionally
//! carrying a scripted extraction (entities/relations) so the graph
//! queries have something to traverse without a live NLP backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use engram_client::{EngramConfig, EpisodeParams, MemoryClient};
use engram_extract::{ExtractError, Extraction, Extractor};

mod commands;

use commands::{graph, info, memory};

/// Engram - temporal knowledge graph memory
///
/// Ingests free-text episodes, extracts entities and relations into a
/// bi-temporal graph, and answers hybrid search and point-in-time queries
/// over the CSP/1 text protocol.
#[derive(Parser)]
#[command(
    name = "engram",
    version,
    about = "Engram CLI - episodic graph memory",
    long_about = "Engram stores conversation episodes in a bi-temporally versioned\n\
                  knowledge graph and answers hybrid-ranked search, relation\n\
                  traversal, and as-of reconstruction queries in CSP/1."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Episode log (JSON Lines) to ingest before running the command
    #[arg(long, global = true)]
    replay: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an episode to the graph
    Add(memory::AddArgs),

    /// Hybrid search over stored episodes
    Search(memory::SearchArgs),

    /// Search entities in the knowledge graph
    Entities(memory::EntitiesArgs),

    /// Traverse an entity's currently-valid relations
    Relations(graph::RelationsArgs),

    /// Reconstruct an entity's state at an instant
    Snapshot(graph::SnapshotArgs),

    /// Show store statistics
    Stats(graph::StatsArgs),

    /// Show version and backend information
    Info(info::InfoArgs),
}

/// Hands out the replay file's scripted extractions in ingest order, then
/// empty extractions for any episode added interactively afterwards.
#[derive(Debug)]
struct ReplayExtractor {
    scripted: std::sync::Mutex<std::collections::VecDeque<Extraction>>,
}

impl ReplayExtractor {
    fn new(extractions: Vec<Extraction>) -> Self {
        Self {
            scripted: std::sync::Mutex::new(extractions.into()),
        }
    }
}

#[async_trait::async_trait]
impl Extractor for ReplayExtractor {
    fn name(&self) -> &str {
        "replay"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, _content: &str) -> Result<Extraction, ExtractError> {
        let mut scripted = self
            .scripted
            .lock()
            .map_err(|_| ExtractError::Failed("replay queue poisoned".to_string()))?;
        Ok(scripted.pop_front().unwrap_or_default())
    }
}

/// One line of the replay file.
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    content: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source_description: Option<String>,
    #[serde(default)]
    reference_time: Option<DateTime<Utc>>,
    #[serde(default)]
    group_id: Option<String>,
    /// Scripted extraction for this episode
    #[serde(default)]
    extraction: Extraction,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        // Failures reach the caller as a STATUS FAIL response, never as an
        // unformatted fault.
        eprintln!("{}", engram_proto::format_error_response(&err.to_string()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli).await?;

    match cli.command {
        Commands::Add(args) => memory::add(&client, args).await,
        Commands::Search(args) => memory::search(&client, args).await,
        Commands::Entities(args) => memory::entities(&client, args).await,
        Commands::Relations(args) => graph::relations(&client, args).await,
        Commands::Snapshot(args) => graph::snapshot(&client, args).await,
        Commands::Stats(args) => graph::stats(&client, args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Assemble the client from configuration and replay the episode log.
async fn build_client(cli: &Cli) -> Result<MemoryClient> {
    let mut builder = MemoryClient::builder();

    if let Some(path) = &cli.config {
        let config = EngramConfig::load(path)?;
        tracing::info!(
            uri = %config.graph.uri,
            database = %config.graph.database,
            "Configuration loaded"
        );
        builder = builder
            .weights(config.search)
            .timeout(Duration::from_millis(config.timeout_ms));
    }

    let records = match &cli.replay {
        Some(path) => load_replay(path)?,
        None => Vec::new(),
    };

    if !records.is_empty() {
        // The scripted extractions are consumed in file order, one per
        // ingested episode.
        let extractions: Vec<Extraction> =
            records.iter().map(|r| r.extraction.clone()).collect();
        builder = builder.extractor(Arc::new(ReplayExtractor::new(extractions)));
    }

    let client = builder.build()?;

    for record in records {
        let mut params = EpisodeParams::new(&record.content);
        if let Some(name) = &record.name {
            params = params.with_name(name);
        }
        if let Some(source) = &record.source_description {
            params = params.with_source(source);
        }
        if let Some(reference_time) = record.reference_time {
            params = params.at(reference_time);
        }
        if let Some(group) = &record.group_id {
            params = params.in_group(group);
        }
        client.add_episode(params).await?;
    }

    Ok(client)
}

fn load_replay(path: &PathBuf) -> Result<Vec<ReplayRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read replay log {}", path.display()))?;
    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(line)
            .with_context(|| format!("malformed replay record on line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
}
