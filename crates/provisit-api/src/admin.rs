//! Health checks and whole-store backup.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | Liveness only |
//! | `GET`  | `/dbhealth` | Row counts; 500 if the store is unreachable |
//! | `GET`  | `/admin/export` | Full [`Snapshot`] |
//! | `POST` | `/admin/import` | Replaces all data with the posted snapshot |

use axum::{Json, extract::State};
use provisit_core::store::{Snapshot, StoreCounts, VisitStore};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError, extract::JsonBody};

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "ok": true })) }

#[derive(Debug, Serialize)]
pub struct DbHealth {
  pub ok:     bool,
  pub counts: StoreCounts,
}

/// `GET /dbhealth`
pub async fn db_health<S: VisitStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<DbHealth>, ApiError> {
  let counts = state
    .store
    .counts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(DbHealth { ok: true, counts }))
}

/// `GET /admin/export`
pub async fn export<S: VisitStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Snapshot>, ApiError> {
  let snapshot = state
    .store
    .export_all()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(snapshot))
}

/// `POST /admin/import` with a snapshot from `/admin/export`
///
/// Responds with the row counts after the import.
pub async fn import<S: VisitStore>(
  State(state): State<ApiState<S>>,
  JsonBody(snapshot): JsonBody<Snapshot>,
) -> Result<Json<StoreCounts>, ApiError> {
  snapshot.validate()?;
  state
    .store
    .import_all(snapshot)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let counts = state
    .store
    .counts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(?counts, "snapshot imported");
  Ok(Json(counts))
}
