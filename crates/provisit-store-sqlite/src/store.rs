//! [`SqliteStore`]: the SQLite implementation of [`VisitStore`].

use std::{collections::HashMap, path::Path};

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;

use provisit_core::{
  attendance::{Attendance, NewAttendance},
  store::{Snapshot, StoreCounts, VisitStore},
  supplier::{NewSupplier, Supplier, SupplierPatch},
  visit::{NewVisit, Visit},
};

use crate::{
  Result,
  encode::{
    ATTENDANCE_COLUMNS, RawAttendance, RawSupplier, RawVisit, SUPPLIER_COLUMNS,
    VISIT_COLUMNS, encode_date, encode_dt, encode_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A provisit row store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Import helpers ──────────────────────────────────────────────────────────

/// Encoded `suppliers` row plus the id it had in the snapshot.
type SupplierImport = (i64, String, Option<String>, Option<String>, String);
/// Encoded `visits` row plus old visit id and old supplier id.
type VisitImport = (i64, i64, String, Option<String>, String);
/// Encoded `attendance` row plus old visit id.
type AttendanceImport = (i64, bool, Option<bool>, Option<String>, String);

/// Rows dropped because their parent was missing from the snapshot.
#[derive(Debug, Default)]
struct ImportSkips {
  visits:     usize,
  attendance: usize,
}

fn encode_snapshot(
  snapshot: Snapshot,
) -> Result<(Vec<SupplierImport>, Vec<VisitImport>, Vec<AttendanceImport>)> {
  let Snapshot { mut suppliers, mut visits, mut attendance, .. } = snapshot;
  // Ascending old ids keep relative order, and with it latest-wins.
  suppliers.sort_by_key(|s| s.supplier_id);
  visits.sort_by_key(|v| v.visit_id);
  attendance.sort_by_key(|a| a.attendance_id);

  let suppliers = suppliers
    .into_iter()
    .map(|s| {
      Ok((
        s.supplier_id,
        s.name,
        s.pattern.as_ref().map(encode_pattern).transpose()?,
        s.visit_type,
        encode_dt(s.created_at),
      ))
    })
    .collect::<Result<Vec<_>>>()?;
  let visits = visits
    .into_iter()
    .map(|v| {
      (v.visit_id, v.supplier_id, encode_date(v.date), v.visit_type, encode_dt(v.created_at))
    })
    .collect();
  let attendance = attendance
    .into_iter()
    .map(|a| (a.visit_id, a.attended, a.did_preorder, a.status, encode_dt(a.created_at)))
    .collect();

  Ok((suppliers, visits, attendance))
}

// ─── VisitStore impl ─────────────────────────────────────────────────────────

impl VisitStore for SqliteStore {
  type Error = crate::Error;

  // ── Suppliers ─────────────────────────────────────────────────────────────

  async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
    let raws: Vec<RawSupplier> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY supplier_id DESC"
        ))?;
        let rows = stmt
          .query_map([], RawSupplier::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSupplier::into_supplier).collect()
  }

  async fn get_supplier(&self, id: i64) -> Result<Option<Supplier>> {
    let raw: Option<RawSupplier> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE supplier_id = ?1"),
            rusqlite::params![id],
            RawSupplier::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSupplier::into_supplier).transpose()
  }

  async fn insert_supplier(&self, input: NewSupplier) -> Result<Supplier> {
    let created_at   = Utc::now();
    let pattern_json = input.pattern.as_ref().map(encode_pattern).transpose()?;
    let name         = input.name.clone();
    let visit_type   = input.visit_type.clone();
    let at_str       = encode_dt(created_at);

    let supplier_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO suppliers (name, pattern_json, visit_type, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, pattern_json, visit_type, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Supplier {
      supplier_id,
      name: input.name,
      pattern: input.pattern,
      visit_type: input.visit_type,
      created_at,
    })
  }

  async fn update_supplier(
    &self,
    id:    i64,
    patch: SupplierPatch,
  ) -> Result<Option<Supplier>> {
    let pattern_json = patch.pattern.as_ref().map(encode_pattern).transpose()?;
    let name         = patch.name;
    let visit_type   = patch.visit_type;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE suppliers SET
             name         = COALESCE(?2, name),
             pattern_json = COALESCE(?3, pattern_json),
             visit_type   = COALESCE(?4, visit_type)
           WHERE supplier_id = ?1",
          rusqlite::params![id, name, pattern_json, visit_type],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_supplier(id).await
  }

  async fn delete_supplier(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM suppliers WHERE supplier_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn list_visits(&self, date: Option<NaiveDate>) -> Result<Vec<Visit>> {
    let date_str = date.map(encode_date);

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(d) = date_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits WHERE date = ?1 ORDER BY visit_id DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![d], RawVisit::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits ORDER BY visit_id DESC"
          ))?;
          stmt
            .query_map([], RawVisit::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  async fn get_visit(&self, id: i64) -> Result<Option<Visit>> {
    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {VISIT_COLUMNS} FROM visits WHERE visit_id = ?1"),
            rusqlite::params![id],
            RawVisit::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn find_visit(
    &self,
    supplier_id: i64,
    date:        NaiveDate,
    label:       Option<&str>,
  ) -> Result<Option<Visit>> {
    let date_str  = encode_date(date);
    let label_str = label.map(str::to_owned);

    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {VISIT_COLUMNS} FROM visits
               WHERE supplier_id = ?1
                 AND date = ?2
                 AND (?3 IS NULL OR visit_type = ?3)
               ORDER BY visit_id DESC
               LIMIT 1"
            ),
            rusqlite::params![supplier_id, date_str, label_str],
            RawVisit::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn insert_visit(&self, input: NewVisit) -> Result<Visit> {
    let created_at  = Utc::now();
    let supplier_id = input.supplier_id;
    let date_str    = encode_date(input.date);
    let visit_type  = input.visit_type.clone();
    let at_str      = encode_dt(created_at);

    let visit_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO visits (supplier_id, date, visit_type, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![supplier_id, date_str, visit_type, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Visit {
      visit_id,
      supplier_id,
      date: input.date,
      visit_type: input.visit_type,
      created_at,
    })
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn list_attendance(&self) -> Result<Vec<Attendance>> {
    let raws: Vec<RawAttendance> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY attendance_id DESC"
        ))?;
        let rows = stmt
          .query_map([], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_attendance).collect()
  }

  async fn insert_attendance(&self, input: NewAttendance) -> Result<Attendance> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let row        = input.clone();

    let attendance_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance (visit_id, attended, did_preorder, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.visit_id, row.attended, row.did_preorder, row.status, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Attendance {
      attendance_id,
      visit_id: input.visit_id,
      attended: input.attended,
      did_preorder: input.did_preorder,
      status: input.status,
      created_at,
    })
  }

  // ── Bulk ──────────────────────────────────────────────────────────────────

  async fn export_all(&self) -> Result<Snapshot> {
    let (suppliers, visits, attendance) = self
      .conn
      .call(|conn| {
        let suppliers = conn
          .prepare(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY supplier_id ASC"
          ))?
          .query_map([], RawSupplier::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let visits = conn
          .prepare(&format!("SELECT {VISIT_COLUMNS} FROM visits ORDER BY visit_id ASC"))?
          .query_map([], RawVisit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let attendance = conn
          .prepare(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY attendance_id ASC"
          ))?
          .query_map([], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((suppliers, visits, attendance))
      })
      .await?;

    Ok(Snapshot {
      suppliers:   suppliers
        .into_iter()
        .map(RawSupplier::into_supplier)
        .collect::<Result<_>>()?,
      visits:      visits.into_iter().map(RawVisit::into_visit).collect::<Result<_>>()?,
      attendance:  attendance
        .into_iter()
        .map(RawAttendance::into_attendance)
        .collect::<Result<_>>()?,
      exported_at: Some(Utc::now()),
    })
  }

  async fn import_all(&self, snapshot: Snapshot) -> Result<()> {
    snapshot.validate().map_err(crate::Error::InvalidSnapshot)?;
    let (suppliers, visits, attendance) = encode_snapshot(snapshot)?;
    let imported = (suppliers.len(), visits.len(), attendance.len());

    let skips = self
      .conn
      .call(move |conn| {
        // Dropping `tx` on any early return rolls the whole import back.
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM attendance", [])?;
        tx.execute("DELETE FROM visits", [])?;
        tx.execute("DELETE FROM suppliers", [])?;

        let mut skips = ImportSkips::default();
        let mut supplier_ids: HashMap<i64, i64> = HashMap::new();
        let mut visit_ids: HashMap<i64, i64> = HashMap::new();
        {
          let mut stmt = tx.prepare(
            "INSERT INTO suppliers (name, pattern_json, visit_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (old_id, name, pattern_json, visit_type, created_at) in &suppliers {
            let new_id =
              stmt.insert(rusqlite::params![name, pattern_json, visit_type, created_at])?;
            supplier_ids.insert(*old_id, new_id);
          }
        }
        {
          let mut stmt = tx.prepare(
            "INSERT INTO visits (supplier_id, date, visit_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (old_id, old_supplier, date, visit_type, created_at) in &visits {
            let Some(supplier_id) = supplier_ids.get(old_supplier) else {
              skips.visits += 1;
              continue;
            };
            let new_id =
              stmt.insert(rusqlite::params![supplier_id, date, visit_type, created_at])?;
            visit_ids.insert(*old_id, new_id);
          }
        }
        {
          let mut stmt = tx.prepare(
            "INSERT INTO attendance (visit_id, attended, did_preorder, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (old_visit, attended, did_preorder, status, created_at) in &attendance {
            let Some(visit_id) = visit_ids.get(old_visit) else {
              skips.attendance += 1;
              continue;
            };
            stmt.execute(rusqlite::params![
              visit_id,
              attended,
              did_preorder,
              status,
              created_at
            ])?;
          }
        }

        tx.commit()?;
        Ok(skips)
      })
      .await?;

    tracing::info!(
      suppliers = imported.0,
      visits = imported.1 - skips.visits,
      attendance = imported.2 - skips.attendance,
      skipped_visits = skips.visits,
      skipped_attendance = skips.attendance,
      "snapshot imported"
    );
    Ok(())
  }

  async fn counts(&self) -> Result<StoreCounts> {
    let (suppliers, visits, attendance): (i64, i64, i64) = self
      .conn
      .call(|conn| {
        let count = |table: &str| -> rusqlite::Result<i64> {
          conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        };
        Ok((count("suppliers")?, count("visits")?, count("attendance")?))
      })
      .await?;

    Ok(StoreCounts {
      suppliers:  suppliers.unsigned_abs(),
      visits:     visits.unsigned_abs(),
      attendance: attendance.unsigned_abs(),
    })
  }
}
