//! orgdir server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `ORGDIR_*` environment variables, opens the SQLite store, and serves the
//! directory API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use orgdir_server::{ServerConfig, expand_tilde, log_filter, router};
use orgdir_store_sqlite::SqliteStore;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "Organizations directory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let (filter, recognised) = log_filter(&server_cfg.log_level);
  tracing_subscriber::fmt().with_env_filter(filter).init();
  if !recognised {
    tracing::warn!(log_level = %server_cfg.log_level, "unknown log level, falling back to info");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_max_activity_depth(server_cfg.max_activity_depth);
  tracing::info!(
    store = %store_path.display(),
    max_activity_depth = server_cfg.max_activity_depth,
    "store ready"
  );

  let app = router(&server_cfg, store);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
