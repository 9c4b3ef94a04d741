//! The daily attendance sheet.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result,
  attendance::{AttendanceState, latest_by_visit},
  reconcile::ensure_visits_for_date,
  store::VisitStore,
  visit::Visit,
  visit_type::VisitType,
};

/// One line of the attendance sheet for a date.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntry {
  pub visit:         Visit,
  pub supplier_name: Option<String>,
  pub visit_type:    VisitType,
  pub action_label:  &'static str,
  pub state:         AttendanceState,
}

/// Backfill `date`, then list its visits (newest first) with their resolved
/// type and current attendance state.
pub async fn agenda_for_date<S: VisitStore>(
  store: &S,
  date: NaiveDate,
) -> Result<Vec<AgendaEntry>> {
  ensure_visits_for_date(store, date).await?;

  let (suppliers, visits, attendance) = tokio::try_join!(
    store.list_suppliers(),
    store.list_visits(Some(date)),
    store.list_attendance(),
  )
  .map_err(Error::store)?;
  let latest = latest_by_visit(&attendance);

  Ok(
    visits
      .into_iter()
      .map(|visit| {
        let supplier = suppliers.iter().find(|s| s.supplier_id == visit.supplier_id);
        let visit_type = VisitType::resolve(&visit, supplier);
        let state = AttendanceState::from_latest(latest.get(&visit.visit_id).copied());
        AgendaEntry {
          supplier_name: supplier.map(|s| s.name.clone()),
          action_label: visit_type.action_label(),
          visit_type,
          state,
          visit,
        }
      })
      .collect(),
  )
}
