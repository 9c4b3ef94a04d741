//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! patterns as compact JSON and booleans as 0/1 integers.

use chrono::{DateTime, NaiveDate, Utc};
use provisit_core::{
  attendance::Attendance,
  supplier::{Pattern, Supplier},
  visit::Visit,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Pattern ─────────────────────────────────────────────────────────────────

pub fn encode_pattern(p: &Pattern) -> Result<String> { Ok(serde_json::to_string(p)?) }

pub fn decode_pattern(s: &str) -> Result<Pattern> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUPPLIER_COLUMNS: &str = "supplier_id, name, pattern_json, visit_type, created_at";

/// Raw values read directly from a `suppliers` row.
pub struct RawSupplier {
  pub supplier_id:  i64,
  pub name:         String,
  pub pattern_json: Option<String>,
  pub visit_type:   Option<String>,
  pub created_at:   String,
}

impl RawSupplier {
  /// Map a row selected with [`SUPPLIER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      supplier_id:  row.get(0)?,
      name:         row.get(1)?,
      pattern_json: row.get(2)?,
      visit_type:   row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_supplier(self) -> Result<Supplier> {
    Ok(Supplier {
      supplier_id: self.supplier_id,
      name:        self.name,
      pattern:     self.pattern_json.as_deref().map(decode_pattern).transpose()?,
      visit_type:  self.visit_type,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const VISIT_COLUMNS: &str = "visit_id, supplier_id, date, visit_type, created_at";

/// Raw values read directly from a `visits` row.
pub struct RawVisit {
  pub visit_id:    i64,
  pub supplier_id: i64,
  pub date:        String,
  pub visit_type:  Option<String>,
  pub created_at:  String,
}

impl RawVisit {
  /// Map a row selected with [`VISIT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit_id:    row.get(0)?,
      supplier_id: row.get(1)?,
      date:        row.get(2)?,
      visit_type:  row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:    self.visit_id,
      supplier_id: self.supplier_id,
      date:        decode_date(&self.date)?,
      visit_type:  self.visit_type,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const ATTENDANCE_COLUMNS: &str =
  "attendance_id, visit_id, attended, did_preorder, status, created_at";

/// Raw values read directly from an `attendance` row.
pub struct RawAttendance {
  pub attendance_id: i64,
  pub visit_id:      i64,
  pub attended:      i64,
  pub did_preorder:  Option<i64>,
  pub status:        Option<String>,
  pub created_at:    String,
}

impl RawAttendance {
  /// Map a row selected with [`ATTENDANCE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: row.get(0)?,
      visit_id:      row.get(1)?,
      attended:      row.get(2)?,
      did_preorder:  row.get(3)?,
      status:        row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_attendance(self) -> Result<Attendance> {
    Ok(Attendance {
      attendance_id: self.attendance_id,
      visit_id:      self.visit_id,
      attended:      self.attended != 0,
      did_preorder:  self.did_preorder.map(|v| v != 0),
      status:        self.status,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
