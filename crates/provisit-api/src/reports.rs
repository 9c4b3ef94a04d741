//! Handler for `GET /reports`.

use axum::{
  Json,
  extract::State,
};
use chrono::NaiveDate;
use provisit_core::{
  report::{ReportRow, build_report},
  store::VisitStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::QueryParams};

#[derive(Debug, Deserialize)]
pub struct ReportParams {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

/// `GET /reports?start=<date>&end=<date>`, 400 if `start > end`
pub async fn handler<S: VisitStore>(
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<ReportParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
  let rows = build_report(&*state.store, params.start, params.end).await?;
  Ok(Json(rows))
}
