//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use subjects_graph::{GraphClient, GraphStore, MemoryStore, Neo4jStore, SubjectService};
use tracing::info;

use crate::config::AppConfig;

pub mod ingest;
pub mod subject;

/// Subjects RW - keeps Subject taxonomy concepts in sync with Neo4j
#[derive(Parser)]
#[command(name = "subjects-rw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML config file with [graph] and [service] tables
    #[arg(short, long, global = true, env = "SUBJECTS_RW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Store connection overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Neo4j bolt URI
    #[arg(long, global = true, env = "NEO_URL")]
    pub neo_url: Option<String>,

    #[arg(long, global = true, env = "NEO_USER")]
    pub neo_user: Option<String>,

    #[arg(long, global = true, env = "NEO_PASSWORD", hide_env_values = true)]
    pub neo_password: Option<String>,

    #[arg(long, global = true, env = "NEO_DATABASE")]
    pub neo_database: Option<String>,

    /// Statement count above which a batch is logged as oversized
    #[arg(long, global = true, env = "BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Use a throwaway in-memory graph instead of Neo4j
    #[arg(long, global = true)]
    pub memory: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Declare the uniqueness constraints subjects rely on
    Init,

    /// Print a subject as JSON
    Read {
        /// Subject uuid
        uuid: String,
    },

    /// Create or replace a subject from a JSON document
    Write {
        /// JSON file, or `-` for stdin
        input: String,
    },

    /// Delete a subject
    Delete {
        /// Subject uuid
        uuid: String,
    },

    /// Count stored subjects
    Count,

    /// Check connectivity to the graph store
    Check,

    /// Write a newline-delimited feed of subjects
    Ingest(ingest::IngestArgs),
}

pub type Service = SubjectService<Arc<dyn GraphStore>>;

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?.apply(&self.connection)?;
        let service = connect(&config, self.connection.memory).await?;

        match self.command {
            Commands::Init => subject::cmd_init(&service).await,
            Commands::Read { uuid } => subject::cmd_read(&service, &uuid).await,
            Commands::Write { input } => subject::cmd_write(&service, &input).await,
            Commands::Delete { uuid } => subject::cmd_delete(&service, &uuid).await,
            Commands::Count => subject::cmd_count(&service).await,
            Commands::Check => subject::cmd_check(&service).await,
            Commands::Ingest(args) => ingest::execute(&service, args).await,
        }
    }
}

/// Build the engine over the configured store.
pub async fn connect(config: &AppConfig, memory: bool) -> Result<Service> {
    let store: Arc<dyn GraphStore> = if memory {
        Arc::new(MemoryStore::new())
    } else {
        let client = GraphClient::connect(&config.graph)
            .await
            .with_context(|| format!("Could not connect to Neo4j at {}", config.graph.uri))?;
        Arc::new(Neo4jStore::new(client, config.service.request_timeout()))
    };
    info!(store = %store.describe(), batch_size = config.service.batch_size, "Graph store ready");
    Ok(SubjectService::new(store, config.service.clone()))
}

/// Read a whole input argument: a path, or `-` for stdin.
pub async fn read_input(input: &str) -> Result<String> {
    use tokio::io::AsyncReadExt;

    if input == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read stdin")?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {input}"))
    }
}
