//! Handlers for `/visits` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/visits` | Optional `?date=YYYY-MM-DD`; `&autogen=1` backfills first |
//! | `POST` | `/visits` | Manual visit for one supplier |
//! | `POST` | `/visits/all-suppliers` | One visit per supplier on a date |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use provisit_core::{
  reconcile::{create_visits_for_all_suppliers, ensure_visits_for_date},
  registry,
  store::VisitStore,
  visit::Visit,
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  extract::{JsonBody, QueryParams},
  today,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub date:    Option<NaiveDate>,
  pub autogen: Option<String>,
}

impl ListParams {
  fn autogen(&self) -> bool {
    matches!(self.autogen.as_deref(), Some("1" | "true" | "yes"))
  }
}

/// `GET /visits[?date=<date>[&autogen=1]]`
pub async fn list<S: VisitStore>(
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Visit>>, ApiError> {
  if let (Some(date), true) = (params.date, params.autogen()) {
    ensure_visits_for_date(&*state.store, date).await?;
  }
  let visits = state
    .store
    .list_visits(params.date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(visits))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub supplier_id: i64,
  pub date:        NaiveDate,
  #[serde(default)]
  pub visit_type:  Option<String>,
}

/// `POST /visits` — body: `{"supplier_id":1,"date":"2024-03-10"}`
pub async fn create<S: VisitStore>(
  State(state): State<ApiState<S>>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let visit =
    registry::add_visit(&*state.store, body.supplier_id, body.date, body.visit_type)
      .await?;
  Ok((StatusCode::CREATED, Json(visit)))
}

// ─── All suppliers ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AllSuppliersBody {
  /// Defaults to today.
  #[serde(default)]
  pub date:       Option<NaiveDate>,
  #[serde(default)]
  pub visit_type: Option<String>,
}

/// `POST /visits/all-suppliers` with `{"date":"2024-03-10","visit_type":"Preventa"}`
///
/// Responds with only the visits that were created.
pub async fn create_for_all<S: VisitStore>(
  State(state): State<ApiState<S>>,
  JsonBody(body): JsonBody<AllSuppliersBody>,
) -> Result<impl IntoResponse, ApiError> {
  let date = body.date.unwrap_or_else(today);
  let created =
    create_visits_for_all_suppliers(&*state.store, date, body.visit_type).await?;
  Ok((StatusCode::CREATED, Json(created)))
}
