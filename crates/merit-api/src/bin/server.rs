//! Achievement verification server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `MERIT_*`
//! environment overrides, opens the SQLite-backed stores, and serves the
//! JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use merit_api::{AppState, DiskFileStore, ServerConfig};
use merit_engine::Coordinator;
use merit_store_sqlite::{SqliteContentStore, SqliteDirectory, SqliteReferenceStore};

#[derive(Parser)]
#[command(author, version, about = "Achievement verification server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

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
    .add_source(config::Environment::with_prefix("MERIT"))
    .build()
    .context("failed to read config")?;
  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let references = SqliteReferenceStore::open(&server_cfg.reference_db)
    .await
    .with_context(|| format!("failed to open reference store at {:?}", server_cfg.reference_db))?;
  let content = SqliteContentStore::open(&server_cfg.content_db)
    .await
    .with_context(|| format!("failed to open content store at {:?}", server_cfg.content_db))?;
  let directory = SqliteDirectory::open(&server_cfg.directory_db)
    .await
    .with_context(|| format!("failed to open directory at {:?}", server_cfg.directory_db))?;
  let files = DiskFileStore::open(&server_cfg.files_dir, server_cfg.files_base_url.clone())
    .await
    .with_context(|| format!("failed to open files dir at {:?}", server_cfg.files_dir))?;

  let directory = Arc::new(directory);
  let coordinator = Arc::new(Coordinator::new(
    Arc::new(references),
    Arc::new(content),
    Arc::clone(&directory),
    Arc::new(files),
  ));

  let state = AppState { coordinator, directory };
  let app = merit_api::router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
