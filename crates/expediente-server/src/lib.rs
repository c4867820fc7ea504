//! HTTP server wiring for Expediente.
//!
//! Holds the runtime configuration, reference-data seeding and the top-level
//! router. The `server` binary in `main.rs` drives these.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use expediente_core::{persistence::ServiceConfig, store::CaseStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `EXPEDIENTE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default = "default_read_timeout")]
  pub read_timeout_secs:  u64,
  #[serde(default = "default_write_timeout")]
  pub write_timeout_secs: u64,
  /// Attention types registered at startup if their role is missing.
  #[serde(default)]
  pub attention_types:    Vec<AttentionTypeSeed>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AttentionTypeSeed {
  pub role: String,
  pub name: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_read_timeout() -> u64 { 10 }
fn default_write_timeout() -> u64 { 15 }

impl ServerConfig {
  pub fn service_config(&self) -> ServiceConfig {
    ServiceConfig {
      read_timeout:  Duration::from_secs(self.read_timeout_secs),
      write_timeout: Duration::from_secs(self.write_timeout_secs),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Seeding ──────────────────────────────────────────────────────────────────

/// Register every configured attention type whose role is not yet present.
/// Existing rows are left untouched. Returns the number of types added.
pub async fn seed_attention_types<S: CaseStore>(
  store: &S,
  seeds: &[AttentionTypeSeed],
) -> Result<usize, S::Error> {
  let mut added = 0;
  for seed in seeds {
    if store.find_attention_type(&seed.role).await?.is_some() {
      tracing::debug!(role = %seed.role, "attention type already registered");
      continue;
    }
    store
      .add_attention_type(seed.role.clone(), seed.name.clone())
      .await?;
    tracing::info!(role = %seed.role, name = %seed.name, "registered attention type");
    added += 1;
  }
  Ok(added)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api` with request tracing.
pub fn router<S: CaseStore + 'static>(store: Arc<S>, config: &ServerConfig) -> Router {
  Router::new()
    .nest("/api", expediente_api::api_router(store, config.service_config()))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use expediente_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config() -> ServerConfig {
    ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               0,
      store_path:         PathBuf::from(":memory:"),
      read_timeout_secs:  2,
      write_timeout_secs: 3,
      attention_types:    vec![
        AttentionTypeSeed { role: "trabajo_social".into(), name: "Trabajo social".into() },
        AttentionTypeSeed { role: "psicologia".into(), name: "Psicología".into() },
      ],
    }
  }

  #[test]
  fn config_fills_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("store_path", "~/expediente.db")
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.service_config().read_timeout, Duration::from_secs(10));
    assert_eq!(cfg.service_config().write_timeout, Duration::from_secs(15));
    assert!(cfg.attention_types.is_empty());
  }

  #[test]
  fn config_reads_attention_types_from_toml() {
    let toml = r#"
      store_path = "/var/lib/expediente.db"
      port = 9000

      [[attention_types]]
      role = "trabajo_social"
      name = "Trabajo social"
    "#;
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.attention_types, vec![AttentionTypeSeed {
      role: "trabajo_social".into(),
      name: "Trabajo social".into(),
    }]);
  }

  #[tokio::test]
  async fn seeding_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let cfg = config();
    assert_eq!(seed_attention_types(&store, &cfg.attention_types).await.unwrap(), 2);
    assert_eq!(seed_attention_types(&store, &cfg.attention_types).await.unwrap(), 0);
    assert!(store.find_attention_type("psicologia").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cfg = config();
    seed_attention_types(store.as_ref(), &cfg.attention_types).await.unwrap();

    let req = Request::builder()
      .uri("/api/attention-types/psicologia")
      .body(Body::empty())
      .unwrap();
    let resp = router(store, &cfg).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["name"], "Psicología");
  }
}
