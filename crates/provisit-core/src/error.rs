//! Error types for `provisit-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid pattern: {0}")]
  InvalidPattern(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("invalid range: {start} is after {end}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },

  #[error("supplier not found: {0}")]
  SupplierNotFound(i64),

  #[error("visit not found: {0}")]
  VisitNotFound(i64),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used by callers to decide how to surface an error
/// and whether retrying can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Storage,
}

impl Error {
  /// Wrap a backend error coming out of a [`crate::store::VisitStore`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidPattern(_) | Self::Validation(_) | Self::InvalidRange { .. } => {
        ErrorKind::Validation
      }
      Self::SupplierNotFound(_) | Self::VisitNotFound(_) => ErrorKind::NotFound,
      Self::Store(_) => ErrorKind::Storage,
    }
  }

  /// Only storage failures are worth retrying; the operations that can fail
  /// that way are either idempotent or append-only.
  pub fn is_retryable(&self) -> bool { self.kind() == ErrorKind::Storage }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
