//! The `VisitStore` trait and the bulk snapshot types.
//!
//! The trait is the row-store contract consumed by the scheduling workflows.
//! It is implemented by storage backends (e.g. `provisit-store-sqlite`);
//! higher layers (`provisit-api`) depend on this abstraction only.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result as CoreResult,
  attendance::{Attendance, NewAttendance},
  supplier::{NewSupplier, Supplier, SupplierPatch},
  visit::{NewVisit, Visit},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Every row in the store, as produced by [`VisitStore::export_all`] and
/// consumed by [`VisitStore::import_all`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub suppliers:   Vec<Supplier>,
  #[serde(default)]
  pub visits:      Vec<Visit>,
  #[serde(default)]
  pub attendance:  Vec<Attendance>,
  #[serde(default)]
  pub exported_at: Option<DateTime<Utc>>,
}

impl Snapshot {
  /// Reject the snapshot if any supplier would fail registration checks.
  pub fn validate(&self) -> CoreResult<()> {
    self.suppliers.iter().try_for_each(Supplier::validate)
  }
}

/// Row counts per table, used for health checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
  pub suppliers:  u64,
  pub visits:     u64,
  pub attendance: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a provisit row-store backend.
///
/// Attendance rows are append-only. Visit rows are only ever inserted or
/// removed by cascade. All identities are store-assigned integers that grow
/// monotonically.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VisitStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Suppliers ─────────────────────────────────────────────────────────

  /// All suppliers, newest first.
  fn list_suppliers(
    &self,
  ) -> impl Future<Output = Result<Vec<Supplier>, Self::Error>> + Send + '_;

  fn get_supplier(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + '_;

  /// Persist an already-validated supplier. `created_at` is set by the store.
  fn insert_supplier(
    &self,
    input: NewSupplier,
  ) -> impl Future<Output = Result<Supplier, Self::Error>> + Send + '_;

  /// Apply `patch`; returns `None` when the supplier does not exist.
  fn update_supplier(
    &self,
    id: i64,
    patch: SupplierPatch,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + '_;

  /// Delete a supplier together with its visits and their attendance.
  /// Returns `false` when nothing was deleted.
  fn delete_supplier(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Visits ────────────────────────────────────────────────────────────

  /// Visits ordered by descending id, optionally restricted to one date.
  fn list_visits(
    &self,
    date: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + '_;

  fn get_visit(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// The most recent visit for `(supplier_id, date)`. When `label` is given
  /// only visits carrying exactly that label match.
  fn find_visit<'a>(
    &'a self,
    supplier_id: i64,
    date: NaiveDate,
    label: Option<&'a str>,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + 'a;

  fn insert_visit(
    &self,
    input: NewVisit,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  // ── Attendance (append-only) ──────────────────────────────────────────

  /// Full attendance history ordered by descending id.
  fn list_attendance(
    &self,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + '_;

  fn insert_attendance(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;

  // ── Bulk ──────────────────────────────────────────────────────────────

  fn export_all(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  /// Replace every row with the contents of `snapshot`, all or nothing.
  ///
  /// Identities are reassigned; references are remapped. Visits whose
  /// supplier is absent from the snapshot are dropped, as are attendance
  /// rows whose visit is absent.
  fn import_all(
    &self,
    snapshot: Snapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn counts(
    &self,
  ) -> impl Future<Output = Result<StoreCounts, Self::Error>> + Send + '_;
}
