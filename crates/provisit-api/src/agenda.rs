//! Handler for `GET /agenda`, the daily attendance sheet.

use axum::{
  Json,
  extract::State,
};
use chrono::NaiveDate;
use provisit_core::{
  agenda::{AgendaEntry, agenda_for_date},
  store::VisitStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::QueryParams, today};

#[derive(Debug, Deserialize)]
pub struct AgendaParams {
  pub date: Option<NaiveDate>,
}

/// `GET /agenda[?date=<date>]`
///
/// Missing pattern visits for the date are created before the sheet is read.
pub async fn handler<S: VisitStore>(
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<AgendaParams>,
) -> Result<Json<Vec<AgendaEntry>>, ApiError> {
  let date = params.date.unwrap_or_else(today);
  Ok(Json(agenda_for_date(&*state.store, date).await?))
}
