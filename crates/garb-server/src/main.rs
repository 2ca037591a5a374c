//! garb server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite variant index, and either serves the catalog API or rebuilds the
//! index from a JSON dump of the authoritative catalog records:
//!
//! ```text
//! garb serve
//! garb reindex --source catalog.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use garb_core::source::CatalogSource;
use garb_engine::orchestrator::{
  CatalogQueryOrchestrator, OrchestratorConfig,
};
use garb_index_sqlite::SqliteIndex;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` with `GARB_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "defaults::host")]
  host: String,
  #[serde(default = "defaults::port")]
  port: u16,
  #[serde(default = "defaults::index_path")]
  index_path: PathBuf,
  #[serde(default = "defaults::query_timeout_secs")]
  query_timeout_secs: u64,
  #[serde(default = "defaults::base_set_ttl_secs")]
  base_set_ttl_secs: u64,
  #[serde(default = "defaults::price_range_ttl_secs")]
  price_range_ttl_secs: u64,
  #[serde(default = "defaults::catalog_ttl_secs")]
  catalog_ttl_secs: u64,
}

mod defaults {
  use std::path::PathBuf;

  pub fn host() -> String { "127.0.0.1".to_string() }
  pub fn port() -> u16 { 8600 }
  pub fn index_path() -> PathBuf { PathBuf::from("garb.db") }
  pub fn query_timeout_secs() -> u64 { 10 }
  pub fn base_set_ttl_secs() -> u64 { 60 }
  pub fn price_range_ttl_secs() -> u64 { 600 }
  pub fn catalog_ttl_secs() -> u64 { 3600 }
}

impl ServerConfig {
  fn orchestrator_config(&self) -> OrchestratorConfig {
    OrchestratorConfig {
      base_set_ttl:    Duration::from_secs(self.base_set_ttl_secs),
      price_range_ttl: Duration::from_secs(self.price_range_ttl_secs),
      catalog_ttl:     Duration::from_secs(self.catalog_ttl_secs),
    }
  }
}

// ─── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "garb catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the catalog API.
  Serve,
  /// Truncate the variant index and repopulate it from a catalog dump.
  Reindex {
    /// JSON file holding the authoritative catalog records.
    #[arg(long)]
    source: PathBuf,
  },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GARB"))
    .build()
    .context("failed to read config file")?;
  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let index = SqliteIndex::open(&server_cfg.index_path)
    .await
    .with_context(|| {
      format!("failed to open index at {:?}", server_cfg.index_path)
    })?;

  match cli.command {
    Command::Serve => serve(server_cfg, index).await,
    Command::Reindex { source } => reindex(index, &source).await,
  }
}

async fn serve(cfg: ServerConfig, index: SqliteIndex) -> anyhow::Result<()> {
  let orchestrator = Arc::new(CatalogQueryOrchestrator::new(
    Arc::new(index),
    cfg.orchestrator_config(),
  ));

  let app = garb_api::api_router(
    orchestrator,
    Duration::from_secs(cfg.query_timeout_secs),
  )
  .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn reindex(
  index: SqliteIndex,
  source_path: &PathBuf,
) -> anyhow::Result<()> {
  let raw = std::fs::read(source_path)
    .with_context(|| format!("failed to read {source_path:?}"))?;
  let source: CatalogSource = serde_json::from_slice(&raw)
    .context("failed to parse catalog source records")?;

  tracing::info!(
    products = source.products.len(),
    attributes = source.attributes.len(),
    "reindexing from {source_path:?}"
  );
  let summary = index.rebuild(&source).await?;
  tracing::info!(
    products = summary.products,
    facts = summary.facts,
    skipped = summary.skipped,
    "reindex complete"
  );
  Ok(())
}
