//! Handlers for `/suppliers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/suppliers` | Newest first |
//! | `POST` | `/suppliers` | Registers and pre-schedules visits |
//! | `GET`  | `/suppliers/{id}` | 404 if not found |
//! | `PATCH`, `PUT` | `/suppliers/{id}` | Partial update |
//! | `DELETE` | `/suppliers/{id}` | Cascades to visits and attendance |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use provisit_core::{
  Error,
  registry::{self, Registration},
  store::VisitStore,
  supplier::{NewSupplier, Supplier, SupplierPatch},
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  extract::{JsonBody, PathParam},
  today,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /suppliers`
pub async fn list<S: VisitStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Supplier>>, ApiError> {
  let suppliers = state
    .store
    .list_suppliers()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(suppliers))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub supplier:   NewSupplier,
  /// First day of pre-scheduling; defaults to today.
  pub start_date: Option<NaiveDate>,
}

/// `POST /suppliers` — body: `{"name":"Bimbo","pattern":{"kind":"daily"}}`
pub async fn create<S: VisitStore>(
  State(state): State<ApiState<S>>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let start = body.start_date.unwrap_or_else(today);
  let registration: Registration =
    registry::register_supplier(&*state.store, body.supplier, start, state.horizon_days)
      .await?;
  Ok((StatusCode::CREATED, Json(registration)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /suppliers/{id}`
pub async fn get_one<S: VisitStore>(
  State(state): State<ApiState<S>>,
  PathParam(id): PathParam<i64>,
) -> Result<Json<Supplier>, ApiError> {
  let supplier = state
    .store
    .get_supplier(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(Error::SupplierNotFound(id))?;
  Ok(Json(supplier))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /suppliers/{id}` with any of `name`, `pattern`, `visit_type`
pub async fn update<S: VisitStore>(
  State(state): State<ApiState<S>>,
  PathParam(id): PathParam<i64>,
  JsonBody(patch): JsonBody<SupplierPatch>,
) -> Result<Json<Supplier>, ApiError> {
  let supplier = registry::update_supplier(&*state.store, id, patch).await?;
  Ok(Json(supplier))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /suppliers/{id}`
pub async fn delete<S: VisitStore>(
  State(state): State<ApiState<S>>,
  PathParam(id): PathParam<i64>,
) -> Result<StatusCode, ApiError> {
  registry::remove_supplier(&*state.store, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
