//! SQL schema for the provisit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `AUTOINCREMENT` keeps ids monotonic and never reused, which the
/// latest-attendance-wins rule depends on.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS suppliers (
    supplier_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    pattern_json TEXT,             -- JSON-encoded Pattern or NULL
    visit_type   TEXT,             -- default visit-type label
    created_at   TEXT NOT NULL     -- RFC 3339 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS visits (
    visit_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    supplier_id INTEGER NOT NULL REFERENCES suppliers(supplier_id) ON DELETE CASCADE,
    date        TEXT NOT NULL,     -- YYYY-MM-DD local calendar date
    visit_type  TEXT,
    created_at  TEXT NOT NULL
);

-- Attendance is strictly append-only.
-- No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS attendance (
    attendance_id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id      INTEGER NOT NULL REFERENCES visits(visit_id) ON DELETE CASCADE,
    attended      INTEGER NOT NULL DEFAULT 0 CHECK (attended IN (0, 1)),
    did_preorder  INTEGER CHECK (did_preorder IN (0, 1)),
    status        TEXT,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS visits_supplier_date_idx ON visits(supplier_id, date);
CREATE INDEX IF NOT EXISTS visits_date_idx          ON visits(date);
CREATE INDEX IF NOT EXISTS attendance_visit_idx     ON attendance(visit_id);

PRAGMA user_version = 1;
";
