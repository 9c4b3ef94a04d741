//! HTTP server wiring for Provisit.
//!
//! Combines the JSON API with request tracing and the runtime configuration
//! read by the `provisit-server` binary.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use provisit_core::{registry::DEFAULT_HORIZON_DAYS, store::VisitStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PROVISIT_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Days of visits scheduled up front for a new supplier.
  #[serde(default = "default_horizon")]
  pub schedule_horizon_days: u32,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_horizon() -> u32 { DEFAULT_HORIZON_DAYS }

impl ServerConfig {
  /// Load from an optional TOML file, then overlay `PROVISIT_*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PROVISIT"))
      .build()?
      .try_deserialize()
  }

  /// `host:port`, ready for binding.
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

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router with request tracing.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: VisitStore + 'static,
{
  provisit_api::api_router(store, config.schedule_horizon_days)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use provisit_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn config_defaults_apply() {
    let cfg = parse(r#"store_path = "~/provisit.db""#);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.schedule_horizon_days, 30);
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn config_values_override_defaults() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 9000
        store_path = "/var/lib/provisit.db"
        schedule_horizon_days = 7
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.schedule_horizon_days, 7);
  }

  #[test]
  fn config_requires_store_path() {
    let result = config::Config::builder()
      .add_source(config::File::from_str("port = 1", config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  #[test]
  fn tilde_is_expanded_only_at_start() {
    let plain = Path::new("/data/provisit.db");
    assert_eq!(expand_tilde(plain), plain);
    let inner = Path::new("data/~/provisit.db");
    assert_eq!(expand_tilde(inner), inner);
  }

  #[tokio::test]
  async fn traced_router_serves_health() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let cfg = parse(r#"store_path = ":memory:""#);
    let app = router(Arc::new(store), &cfg);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));
  }
}
