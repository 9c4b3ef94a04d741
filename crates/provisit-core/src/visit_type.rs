//! Resolution of a visit's effective type from layered defaults.
//!
//! Labels are free text at the boundary. They are canonicalised by an
//! ordered, case-insensitive substring table; anything unmatched passes
//! through title-cased as [`VisitType::Custom`].

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{supplier::Supplier, visit::Visit};

/// Label used when neither the visit nor its supplier names a type.
pub const DEFAULT_LABEL: &str = "Visita Normal";

/// The canonical type of a visit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisitType {
  /// Pre-order visit; a positive outcome provisions a delivery visit.
  Preventa,
  EntregaDePedido,
  VisitaNormal,
  Custom(String),
}

/// Checked in order; the first matching substring wins.
const CLASSIFIER: &[(&str, VisitType)] = &[
  ("preventa", VisitType::Preventa),
  ("entrega", VisitType::EntregaDePedido),
  ("visita", VisitType::VisitaNormal),
];

impl VisitType {
  /// Canonicalise a free-text label.
  pub fn canonicalize(label: &str) -> Self {
    let lowered = label.trim().to_lowercase();
    if lowered.is_empty() {
      return Self::VisitaNormal;
    }
    CLASSIFIER
      .iter()
      .find(|(needle, _)| lowered.contains(needle))
      .map(|(_, ty)| ty.clone())
      .unwrap_or_else(|| Self::Custom(title_case(&lowered)))
  }

  /// Precedence: visit override, then supplier default, then
  /// [`DEFAULT_LABEL`]. Blank labels count as absent.
  pub fn resolve(visit: &Visit, supplier: Option<&Supplier>) -> Self {
    Self::resolve_label(
      visit.visit_type.as_deref(),
      supplier.and_then(|s| s.visit_type.as_deref()),
    )
  }

  /// [`VisitType::resolve`] over raw labels, for visits not yet stored.
  pub fn resolve_label(
    visit_label: Option<&str>,
    supplier_label: Option<&str>,
  ) -> Self {
    let present = |l: &&str| !l.trim().is_empty();
    let label = visit_label
      .filter(present)
      .or(supplier_label.filter(present))
      .unwrap_or(DEFAULT_LABEL);
    Self::canonicalize(label)
  }

  pub fn display_name(&self) -> &str {
    match self {
      Self::Preventa => "Preventa",
      Self::EntregaDePedido => "Entrega de Pedido",
      Self::VisitaNormal => "Visita Normal",
      Self::Custom(name) => name,
    }
  }

  /// The verb shown next to the attendance toggle for this type.
  pub fn action_label(&self) -> &'static str {
    match self {
      Self::Preventa => "Pedir",
      Self::EntregaDePedido => "Entregó",
      Self::VisitaNormal | Self::Custom(_) => "Asistió",
    }
  }
}

impl fmt::Display for VisitType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

impl Serialize for VisitType {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.display_name())
  }
}

/// Upper-case the first character of every space-separated word.
fn title_case(s: &str) -> String {
  s.split(' ')
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}
