//! Handlers for `/attendance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/attendance` | Full history, newest first |
//! | `POST` | `/attendance` | Body: `{"visit_id":1,"attended":true}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use provisit_core::{
  attendance::{Attendance, record_attendance},
  store::VisitStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::JsonBody};

/// `GET /attendance`
pub async fn list<S: VisitStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
  let rows = state
    .store
    .list_attendance()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub visit_id: i64,
  pub attended: bool,
}

/// `POST /attendance`
///
/// The response includes the delivery visit when a positive pre-sale outcome
/// provisioned one.
pub async fn record<S: VisitStore>(
  State(state): State<ApiState<S>>,
  JsonBody(body): JsonBody<RecordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let recorded = record_attendance(&*state.store, body.visit_id, body.attended).await?;
  Ok((StatusCode::CREATED, Json(recorded)))
}
