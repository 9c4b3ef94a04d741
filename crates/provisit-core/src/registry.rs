//! Supplier registration and maintenance.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result,
  reconcile::default_label,
  schedule::expand,
  store::VisitStore,
  supplier::{NewSupplier, Supplier, SupplierPatch, normalize_label},
  visit::{NewVisit, Visit},
};

/// How many days past the start date registration schedules by default.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// A newly registered supplier and the visits scheduled for it.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
  pub supplier: Supplier,
  pub visits:   Vec<Visit>,
}

/// Validate and store a supplier, then schedule its visits from
/// `start_date` through `start_date + horizon_days`.
///
/// Dates on which the supplier already has a visit are skipped.
pub async fn register_supplier<S: VisitStore>(
  store: &S,
  input: NewSupplier,
  start_date: NaiveDate,
  horizon_days: u32,
) -> Result<Registration> {
  let input = input.validated()?;
  let supplier = store.insert_supplier(input).await.map_err(Error::store)?;

  let dates = match &supplier.pattern {
    Some(pattern) => expand(pattern, start_date, horizon_days)?,
    None => Vec::new(),
  };

  let label = default_label(&supplier);
  let mut visits = Vec::with_capacity(dates.len());
  for date in dates {
    let existing = store
      .find_visit(supplier.supplier_id, date, None)
      .await
      .map_err(Error::store)?;
    if existing.is_some() {
      continue;
    }
    let visit = store
      .insert_visit(NewVisit::new(supplier.supplier_id, date, Some(label.clone())))
      .await
      .map_err(Error::store)?;
    visits.push(visit);
  }

  tracing::info!(
    supplier_id = supplier.supplier_id,
    name = %supplier.name,
    scheduled = visits.len(),
    "supplier registered"
  );
  Ok(Registration { supplier, visits })
}

/// Rename a supplier or change its pattern or default type.
pub async fn update_supplier<S: VisitStore>(
  store: &S,
  id: i64,
  patch: SupplierPatch,
) -> Result<Supplier> {
  let patch = patch.validated()?;
  if patch.is_empty() {
    return Err(Error::Validation("nothing to update".into()));
  }
  store
    .update_supplier(id, patch)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SupplierNotFound(id))
}

/// Delete a supplier and, by cascade, its visits and attendance.
pub async fn remove_supplier<S: VisitStore>(store: &S, id: i64) -> Result<()> {
  let deleted = store.delete_supplier(id).await.map_err(Error::store)?;
  if !deleted {
    return Err(Error::SupplierNotFound(id));
  }
  tracing::info!(supplier_id = id, "supplier deleted");
  Ok(())
}

/// Manually add a visit, independent of the supplier's pattern.
pub async fn add_visit<S: VisitStore>(
  store: &S,
  supplier_id: i64,
  date: NaiveDate,
  label: Option<String>,
) -> Result<Visit> {
  store
    .get_supplier(supplier_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SupplierNotFound(supplier_id))?;
  store
    .insert_visit(NewVisit::new(supplier_id, date, normalize_label(label)))
    .await
    .map_err(Error::store)
}
