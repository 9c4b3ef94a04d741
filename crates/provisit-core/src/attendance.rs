//! Attendance records and the state machine that writes them.
//!
//! Attendance is an append-only log. A visit has no stored state field; its
//! state is whatever the attendance row with the highest id says, or
//! [`AttendanceState::Unrecorded`] when there is none. Ordering is by id, not
//! by timestamp, so clock skew between writers cannot reorder outcomes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::VisitStore,
  supplier::Supplier,
  visit::{NewVisit, Visit},
  visit_type::VisitType,
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// One recorded outcome for a visit. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
  pub attendance_id: i64,
  pub visit_id:      i64,
  pub attended:      bool,
  /// Only meaningful for [`VisitType::Preventa`] visits.
  pub did_preorder:  Option<bool>,
  /// Specific status label, e.g. "A tiempo" or "No entregó".
  pub status:        Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`VisitStore::insert_attendance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendance {
  pub visit_id:     i64,
  pub attended:     bool,
  #[serde(default)]
  pub did_preorder: Option<bool>,
  #[serde(default)]
  pub status:       Option<String>,
}

impl NewAttendance {
  /// The row a toggle produces for a visit of type `visit_type`.
  pub fn for_outcome(visit_id: i64, visit_type: &VisitType, attended: bool) -> Self {
    let (did_preorder, status) = match visit_type {
      VisitType::Preventa => {
        (Some(attended), if attended { "Pedir" } else { "No pedir" })
      }
      VisitType::EntregaDePedido => {
        (None, if attended { "Entregó" } else { "No entregó" })
      }
      VisitType::VisitaNormal | VisitType::Custom(_) => {
        (None, if attended { "A tiempo" } else { "No asistió" })
      }
    };
    Self {
      visit_id,
      attended,
      did_preorder,
      status: Some(status.to_owned()),
    }
  }
}

// ─── Derived state ───────────────────────────────────────────────────────────

/// The attendance state of a visit, computed from its latest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttendanceState {
  Unrecorded,
  Recorded {
    attended:     bool,
    did_preorder: Option<bool>,
    status:       Option<String>,
  },
}

impl AttendanceState {
  pub fn from_latest(latest: Option<&Attendance>) -> Self {
    match latest {
      None => Self::Unrecorded,
      Some(a) => Self::Recorded {
        attended:     a.attended,
        did_preorder: a.did_preorder,
        status:       a.status.clone(),
      },
    }
  }

  pub fn attended(&self) -> bool {
    matches!(self, Self::Recorded { attended: true, .. })
  }
}

/// The effective attendance row for `visit_id`: the one with the highest id,
/// regardless of the order `rows` arrive in.
pub fn effective_attendance<'a, I>(rows: I, visit_id: i64) -> Option<&'a Attendance>
where
  I: IntoIterator<Item = &'a Attendance>,
{
  rows
    .into_iter()
    .filter(|a| a.visit_id == visit_id)
    .max_by_key(|a| a.attendance_id)
}

/// Index the effective attendance row of every visit in `rows`.
pub fn latest_by_visit(rows: &[Attendance]) -> HashMap<i64, &Attendance> {
  let mut latest: HashMap<i64, &Attendance> = HashMap::new();
  for row in rows {
    latest
      .entry(row.visit_id)
      .and_modify(|cur| {
        if row.attendance_id > cur.attendance_id {
          *cur = row;
        }
      })
      .or_insert(row);
  }
  latest
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Result of [`record_attendance`].
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAttendance {
  pub attendance:     Attendance,
  pub visit_type:     VisitType,
  /// The next-day delivery visit created by a positive pre-order, if any.
  pub delivery_visit: Option<Visit>,
}

/// Append an attendance outcome for `visit_id`.
///
/// A positive outcome on a [`VisitType::Preventa`] visit also provisions an
/// [`VisitType::EntregaDePedido`] visit for the same supplier on the next
/// day, unless one already exists. That provisioning is best-effort: if it
/// fails the attendance row stays recorded and the failure is logged.
pub async fn record_attendance<S: VisitStore>(
  store: &S,
  visit_id: i64,
  attended: bool,
) -> Result<RecordedAttendance> {
  let visit = store
    .get_visit(visit_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::VisitNotFound(visit_id))?;
  let supplier = store
    .get_supplier(visit.supplier_id)
    .await
    .map_err(Error::store)?;

  let visit_type = VisitType::resolve(&visit, supplier.as_ref());
  let attendance = store
    .insert_attendance(NewAttendance::for_outcome(visit_id, &visit_type, attended))
    .await
    .map_err(Error::store)?;

  tracing::debug!(
    visit_id,
    attended,
    visit_type = %visit_type,
    "attendance recorded"
  );

  let delivery_visit = if visit_type == VisitType::Preventa && attended {
    match provision_delivery(store, &visit, supplier.as_ref()).await {
      Ok(created) => created,
      Err(e) => {
        tracing::warn!(
          visit_id,
          supplier_id = visit.supplier_id,
          error = %e,
          "failed to provision delivery visit"
        );
        None
      }
    }
  } else {
    None
  };

  Ok(RecordedAttendance { attendance, visit_type, delivery_visit })
}

/// Create the next-day delivery visit for a pre-order unless the supplier
/// already has a visit resolving to a delivery on that date.
async fn provision_delivery<S: VisitStore>(
  store: &S,
  visit: &Visit,
  supplier: Option<&Supplier>,
) -> Result<Option<Visit>> {
  let Some(next_day) = visit.date.succ_opt() else {
    return Ok(None);
  };

  let existing = store
    .list_visits(Some(next_day))
    .await
    .map_err(Error::store)?;
  let already = existing.iter().any(|v| {
    v.supplier_id == visit.supplier_id
      && VisitType::resolve(v, supplier) == VisitType::EntregaDePedido
  });
  if already {
    return Ok(None);
  }

  let created = store
    .insert_visit(NewVisit::new(
      visit.supplier_id,
      next_day,
      Some(VisitType::EntregaDePedido.display_name().to_owned()),
    ))
    .await
    .map_err(Error::store)?;

  tracing::info!(
    supplier_id = visit.supplier_id,
    date = %next_day,
    visit_id = created.visit_id,
    "delivery visit provisioned"
  );
  Ok(Some(created))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(attendance_id: i64, visit_id: i64, attended: bool) -> Attendance {
    Attendance {
      attendance_id,
      visit_id,
      attended,
      did_preorder: None,
      status: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn latest_wins_regardless_of_order() {
    let forward = vec![row(5, 1, false), row(9, 1, true)];
    let backward = vec![row(9, 1, true), row(5, 1, false)];

    for rows in [&forward, &backward] {
      let latest = effective_attendance(rows.iter(), 1).unwrap();
      assert_eq!(latest.attendance_id, 9);
      assert!(AttendanceState::from_latest(Some(latest)).attended());

      let index = latest_by_visit(rows);
      assert_eq!(index[&1].attendance_id, 9);
    }
  }

  #[test]
  fn unrecorded_without_rows() {
    let rows = vec![row(3, 2, true)];
    assert!(effective_attendance(rows.iter(), 1).is_none());
    assert_eq!(AttendanceState::from_latest(None), AttendanceState::Unrecorded);
  }

  #[test]
  fn outcome_by_type() {
    let pre = NewAttendance::for_outcome(1, &VisitType::Preventa, true);
    assert_eq!(pre.did_preorder, Some(true));
    assert_eq!(pre.status.as_deref(), Some("Pedir"));
    let pre_no = NewAttendance::for_outcome(1, &VisitType::Preventa, false);
    assert_eq!(pre_no.did_preorder, Some(false));
    assert_eq!(pre_no.status.as_deref(), Some("No pedir"));

    let del = NewAttendance::for_outcome(1, &VisitType::EntregaDePedido, false);
    assert_eq!(del.did_preorder, None);
    assert_eq!(del.status.as_deref(), Some("No entregó"));

    let custom = NewAttendance::for_outcome(1, &VisitType::Custom("Cobro".into()), true);
    assert!(custom.attended);
    assert_eq!(custom.status.as_deref(), Some("A tiempo"));
    let normal = NewAttendance::for_outcome(1, &VisitType::VisitaNormal, false);
    assert_eq!(normal.status.as_deref(), Some("No asistió"));
  }

  #[test]
  fn state_serializes_with_tag() {
    let json = serde_json::to_value(AttendanceState::Unrecorded).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "unrecorded" }));
  }
}
