//! HTTP server assembly for the organizations directory.
//!
//! Loads [`ServerConfig`], mounts [`orgdir_api::api_router`] under
//! [`API_PREFIX`] next to the unauthenticated `/` and `/health` endpoints, and
//! wraps everything in CORS and request-tracing layers.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Json, Router, extract::State, routing::get};
use orgdir_api::{ApiConfig, AppState};
use orgdir_core::{activity::DEFAULT_MAX_DEPTH, store::DirectoryStore};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const API_PREFIX: &str = "/api/v1";

/// Prefix for environment overrides, e.g. `ORGDIR_API_KEY`.
pub const ENV_PREFIX: &str = "ORGDIR";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ORGDIR_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  pub api_key:            String,
  #[serde(default = "default_max_activity_depth")]
  pub max_activity_depth: u8,
  #[serde(default = "default_log_level")]
  pub log_level:          String,
  #[serde(default = "default_project_name")]
  pub project_name:       String,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("orgdir.sqlite3") }
fn default_max_activity_depth() -> u8 { DEFAULT_MAX_DEPTH }
fn default_log_level() -> String { "info".into() }
fn default_project_name() -> String { "Organizations Directory API".into() }

impl ServerConfig {
  /// Layer `ORGDIR_*` environment variables over the optional TOML file at
  /// `path`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    anyhow::ensure!(cfg.max_activity_depth >= 1, "max_activity_depth must be at least 1");
    anyhow::ensure!(!cfg.api_key.is_empty(), "api_key must not be empty");
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Subscriber filter: `RUST_LOG` when set, otherwise `log_level`.
///
/// The flag is `false` when `log_level` was not a level name and `info` was
/// used in its place.
pub fn log_filter(log_level: &str) -> (EnvFilter, bool) {
  let (level, recognised) = match log_level.parse::<LevelFilter>() {
    Ok(level) => (level, true),
    Err(_) => (LevelFilter::INFO, false),
  };
  let filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();
  (filter, recognised)
}

// ─── Router ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
struct Metadata {
  message:    String,
  version:    &'static str,
  api_prefix: &'static str,
}

async fn root(State(meta): State<Arc<Metadata>>) -> Json<Metadata> {
  Json(meta.as_ref().clone())
}

async fn health() -> Json<Value> { Json(json!({ "status": "healthy" })) }

fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any)
}

/// Build the complete application router over `store`.
pub fn router<S>(config: &ServerConfig, store: S) -> Router
where
  S: DirectoryStore + Clone + 'static,
{
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(ApiConfig {
      api_key:            config.api_key.clone(),
      max_activity_depth: config.max_activity_depth,
    }),
  };
  let meta = Arc::new(Metadata {
    message:    config.project_name.clone(),
    version:    env!("CARGO_PKG_VERSION"),
    api_prefix: API_PREFIX,
  });

  Router::new()
    .route("/", get(root))
    .route("/health", get(health))
    .with_state(meta)
    .nest(API_PREFIX, orgdir_api::api_router(state))
    .layer(cors())
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{File, FileFormat};
  use orgdir_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn settings(toml: &str) -> config::Config {
    config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
  }

  fn test_config() -> ServerConfig {
    ServerConfig::from_settings(settings(r#"api_key = "secret""#)).unwrap()
  }

  async fn call(uri: &str, key: Option<&str>) -> (StatusCode, Value) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(&test_config(), store);
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = key {
      builder = builder.header("x-api-key", key);
    }
    let resp = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg = test_config();
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.store_path, PathBuf::from("orgdir.sqlite3"));
    assert_eq!(cfg.max_activity_depth, 3);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.project_name, "Organizations Directory API");
    assert_eq!(cfg.address(), "0.0.0.0:8000");
  }

  #[test]
  fn api_key_is_required() {
    assert!(ServerConfig::from_settings(settings("port = 9000")).is_err());
    assert!(ServerConfig::from_settings(settings(r#"api_key = """#)).is_err());
  }

  #[test]
  fn zero_depth_is_rejected() {
    let toml = "api_key = \"secret\"\nmax_activity_depth = 0";
    assert!(ServerConfig::from_settings(settings(toml)).is_err());
  }

  #[test]
  fn unknown_log_level_falls_back() {
    assert!(log_filter("DEBUG").1);
    assert!(log_filter("warn").1);
    assert!(!log_filter("chatty").1);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/db.sqlite3")), PathBuf::from(home).join("db.sqlite3"));
    assert_eq!(expand_tilde(Path::new("/tmp/db.sqlite3")), PathBuf::from("/tmp/db.sqlite3"));
  }

  #[tokio::test]
  async fn root_and_health_need_no_key() {
    let (status, body) = call("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Organizations Directory API");
    assert_eq!(body["api_prefix"], "/api/v1");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = call("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let (status, _) = call("/api/v1/activities/", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call("/api/v1/activities/tree", Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "activities": [] }));

    let (status, _) = call("/activities/", Some("secret")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
