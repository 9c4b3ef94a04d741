//! On-demand backfill of pattern-implied visits.
//!
//! Nothing runs in the background: visits for a date come into existence the
//! first time somebody asks for that date. Duplicate prevention is a
//! read-then-insert existence check, which is sufficient for a single writer
//! at a time but not race-free across concurrent requests for the same date.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::{
  Error, Result,
  schedule::matches_date,
  store::VisitStore,
  supplier::Supplier,
  visit::{NewVisit, Visit},
  visit_type::{DEFAULT_LABEL, VisitType},
};

/// The label stamped on visits generated for `supplier`.
pub fn default_label(supplier: &Supplier) -> String {
  supplier
    .visit_type
    .clone()
    .unwrap_or_else(|| DEFAULT_LABEL.to_owned())
}

/// Make sure every supplier whose pattern matches `date` has a visit on it.
///
/// Suppliers that already have any visit on `date` are left alone, so calling
/// this repeatedly is safe. Suppliers without a pattern are never scheduled.
/// Returns the visits created by this call.
pub async fn ensure_visits_for_date<S: VisitStore>(
  store: &S,
  date: NaiveDate,
) -> Result<Vec<Visit>> {
  let suppliers = store.list_suppliers().await.map_err(Error::store)?;
  let scheduled: HashSet<i64> = store
    .list_visits(Some(date))
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|v| v.supplier_id)
    .collect();

  let mut created = Vec::new();
  for supplier in &suppliers {
    let Some(pattern) = &supplier.pattern else { continue };
    if !matches_date(pattern, date) || scheduled.contains(&supplier.supplier_id) {
      continue;
    }
    let visit = store
      .insert_visit(NewVisit::new(
        supplier.supplier_id,
        date,
        Some(default_label(supplier)),
      ))
      .await
      .map_err(Error::store)?;
    created.push(visit);
  }

  if !created.is_empty() {
    tracing::info!(%date, created = created.len(), "backfilled scheduled visits");
  }
  Ok(created)
}

/// Create a visit labelled `type_override` on `date` for every supplier,
/// skipping suppliers that already have a visit of the same resolved type
/// that day.
///
/// Without an override the label is [`DEFAULT_LABEL`], whatever the
/// supplier's own default type is.
///
/// Unlike [`ensure_visits_for_date`] this ignores patterns entirely.
pub async fn create_visits_for_all_suppliers<S: VisitStore>(
  store: &S,
  date: NaiveDate,
  type_override: Option<String>,
) -> Result<Vec<Visit>> {
  let label = crate::supplier::normalize_label(type_override)
    .unwrap_or_else(|| DEFAULT_LABEL.to_owned());
  let wanted = VisitType::canonicalize(&label);
  let suppliers = store.list_suppliers().await.map_err(Error::store)?;
  let existing = store
    .list_visits(Some(date))
    .await
    .map_err(Error::store)?;

  let mut created = Vec::new();
  for supplier in &suppliers {
    let duplicate = existing.iter().any(|v| {
      v.supplier_id == supplier.supplier_id
        && VisitType::resolve(v, Some(supplier)) == wanted
    });
    if duplicate {
      tracing::debug!(
        supplier_id = supplier.supplier_id,
        %date,
        visit_type = %wanted,
        "skipping supplier with an equivalent visit"
      );
      continue;
    }
    let visit = store
      .insert_visit(NewVisit::new(supplier.supplier_id, date, Some(label.clone())))
      .await
      .map_err(Error::store)?;
    created.push(visit);
  }

  tracing::info!(%date, created = created.len(), "bulk visits created");
  Ok(created)
}
