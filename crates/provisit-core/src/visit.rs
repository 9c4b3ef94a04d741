//! Visits: one occurrence of a supplier's presence on a calendar date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled or manually-created visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub visit_id:    i64,
  pub supplier_id: i64,
  pub date:        NaiveDate,
  /// Visit-level type label; takes precedence over the supplier default.
  pub visit_type:  Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::VisitStore::insert_visit`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisit {
  pub supplier_id: i64,
  pub date:        NaiveDate,
  #[serde(default)]
  pub visit_type:  Option<String>,
}

impl NewVisit {
  pub fn new(supplier_id: i64, date: NaiveDate, visit_type: Option<String>) -> Self {
    Self { supplier_id, date, visit_type }
  }
}
