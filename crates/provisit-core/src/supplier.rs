//! Suppliers and their recurrence patterns.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum length (in characters, after trimming) of a supplier name.
pub const MIN_NAME_LEN: usize = 2;

// ─── Pattern ─────────────────────────────────────────────────────────────────

/// The recurrence rule governing when a supplier is expected.
///
/// Weekdays are numbered 0–6 starting on Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Pattern {
  Daily,
  Weekly {
    days: BTreeSet<u8>,
  },
  EveryNDays {
    n:          u32,
    start_date: NaiveDate,
  },
}

impl Pattern {
  /// Check the structural invariants a pattern must satisfy before it is
  /// stored.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Daily => Ok(()),
      Self::Weekly { days } => {
        if days.is_empty() {
          return Err(Error::InvalidPattern(
            "weekly pattern needs at least one day".into(),
          ));
        }
        if let Some(day) = days.iter().find(|d| **d > 6) {
          return Err(Error::InvalidPattern(format!(
            "weekday {day} is out of range 0-6"
          )));
        }
        Ok(())
      }
      Self::EveryNDays { n, .. } => {
        if *n < 2 {
          return Err(Error::InvalidPattern(format!("n must be >= 2, got {n}")));
        }
        Ok(())
      }
    }
  }
}

// ─── Supplier ────────────────────────────────────────────────────────────────

/// An external party with a recurring visit obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
  pub supplier_id: i64,
  pub name:        String,
  /// `None` means the supplier is never auto-scheduled.
  pub pattern:     Option<Pattern>,
  /// Default visit-type label for this supplier's visits.
  pub visit_type:  Option<String>,
  pub created_at:  DateTime<Utc>,
}

impl Supplier {
  /// Apply the same name and pattern checks as [`NewSupplier::validated`].
  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)?;
    self.pattern.as_ref().map_or(Ok(()), Pattern::validate)
  }
}

/// Input to [`crate::store::VisitStore::insert_supplier`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
  pub name:       String,
  #[serde(default)]
  pub pattern:    Option<Pattern>,
  #[serde(default)]
  pub visit_type: Option<String>,
}

impl NewSupplier {
  pub fn new(name: impl Into<String>, pattern: Option<Pattern>) -> Self {
    Self { name: name.into(), pattern, visit_type: None }
  }

  pub fn with_visit_type(mut self, visit_type: impl Into<String>) -> Self {
    self.visit_type = Some(visit_type.into());
    self
  }

  /// Validate and normalise: the name is trimmed and blank labels dropped.
  pub fn validated(self) -> Result<Self> {
    let name = validate_name(&self.name)?;
    if let Some(pattern) = &self.pattern {
      pattern.validate()?;
    }
    Ok(Self {
      name,
      pattern: self.pattern,
      visit_type: normalize_label(self.visit_type),
    })
  }
}

/// Partial update for a supplier. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPatch {
  #[serde(default)]
  pub name:       Option<String>,
  #[serde(default)]
  pub pattern:    Option<Pattern>,
  #[serde(default)]
  pub visit_type: Option<String>,
}

impl SupplierPatch {
  pub fn rename(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn validated(self) -> Result<Self> {
    let name = self.name.as_deref().map(validate_name).transpose()?;
    if let Some(pattern) = &self.pattern {
      pattern.validate()?;
    }
    Ok(Self {
      name,
      pattern: self.pattern,
      visit_type: normalize_label(self.visit_type),
    })
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.pattern.is_none() && self.visit_type.is_none()
  }
}

fn validate_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.chars().count() < MIN_NAME_LEN {
    return Err(Error::Validation(format!(
      "supplier name must have at least {MIN_NAME_LEN} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

/// Blank labels behave exactly like missing ones.
pub(crate) fn normalize_label(label: Option<String>) -> Option<String> {
  label
    .map(|l| l.trim().to_owned())
    .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pattern_wire_encoding() {
    let weekly: Pattern =
      serde_json::from_str(r#"{"kind":"weekly","days":[3,1]}"#).unwrap();
    assert_eq!(weekly, Pattern::Weekly { days: BTreeSet::from([1, 3]) });

    let every: Pattern = serde_json::from_str(
      r#"{"kind":"everyNDays","n":3,"start_date":"2024-01-01"}"#,
    )
    .unwrap();
    assert!(matches!(every, Pattern::EveryNDays { n: 3, .. }));

    let daily = serde_json::to_value(Pattern::Daily).unwrap();
    assert_eq!(daily, serde_json::json!({ "kind": "daily" }));
  }

  #[test]
  fn every_n_days_missing_start_date_is_rejected_at_the_boundary() {
    let parsed: Result<Pattern, _> =
      serde_json::from_str(r#"{"kind":"everyNDays","n":3}"#);
    assert!(parsed.is_err());
  }

  #[test]
  fn pattern_invariants() {
    assert!(Pattern::Weekly { days: BTreeSet::new() }.validate().is_err());
    assert!(Pattern::Weekly { days: BTreeSet::from([7]) }.validate().is_err());
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert!(matches!(
      Pattern::EveryNDays { n: 1, start_date: start }.validate(),
      Err(Error::InvalidPattern(_))
    ));
    assert!(Pattern::EveryNDays { n: 2, start_date: start }.validate().is_ok());
  }

  #[test]
  fn new_supplier_is_trimmed_and_checked() {
    let ok = NewSupplier::new("  Acme  ", Some(Pattern::Daily))
      .with_visit_type("   ")
      .validated()
      .unwrap();
    assert_eq!(ok.name, "Acme");
    assert_eq!(ok.visit_type, None);

    let err = NewSupplier::new(" A ", None).validated().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn stored_supplier_is_rechecked() {
    let mut supplier = Supplier {
      supplier_id: 1,
      name:        "Acme".into(),
      pattern:     Some(Pattern::Weekly { days: BTreeSet::from([9]) }),
      visit_type:  None,
      created_at:  chrono::Utc::now(),
    };
    assert!(matches!(supplier.validate(), Err(Error::InvalidPattern(_))));

    supplier.pattern = None;
    assert!(supplier.validate().is_ok());
    supplier.name = "A".into();
    assert!(matches!(supplier.validate(), Err(Error::Validation(_))));
  }
}
