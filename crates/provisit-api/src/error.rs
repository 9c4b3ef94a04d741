//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use provisit_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The request could not be decoded; keeps the extractor's status code.
  #[error("{message}")]
  Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self {
    ApiError::Rejected { status: r.status(), message: r.body_text() }
  }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self {
    ApiError::Rejected { status: r.status(), message: r.body_text() }
  }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self {
    ApiError::Rejected { status: r.status(), message: r.body_text() }
  }
}

impl From<provisit_core::Error> for ApiError {
  fn from(e: provisit_core::Error) -> Self {
    match e.kind() {
      ErrorKind::Validation => ApiError::BadRequest(e.to_string()),
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::Storage => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Rejected { status, message } => (*status, message.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
