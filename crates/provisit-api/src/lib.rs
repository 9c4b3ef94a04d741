//! JSON REST API for Provisit.
//!
//! Exposes an axum [`Router`] backed by any [`provisit_core::store::VisitStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(provisit_api::api_router(store.clone(), 30))
//! ```

pub mod admin;
pub mod agenda;
pub mod attendance;
pub mod error;
pub mod extract;
pub mod reports;
pub mod suppliers;
pub mod visits;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::NaiveDate;
use provisit_core::store::VisitStore;

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S> {
  pub store:        Arc<S>,
  /// How many days ahead a newly registered supplier is scheduled.
  pub horizon_days: u32,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), horizon_days: self.horizon_days }
  }
}

/// The local calendar date, used whenever a request omits one.
pub(crate) fn today() -> NaiveDate { chrono::Local::now().date_naive() }

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, horizon_days: u32) -> Router<()>
where
  S: VisitStore + 'static,
{
  Router::new()
    // Health
    .route("/health", get(admin::health))
    .route("/dbhealth", get(admin::db_health::<S>))
    // Suppliers
    .route(
      "/suppliers",
      get(suppliers::list::<S>).post(suppliers::create::<S>),
    )
    .route(
      "/suppliers/{id}",
      get(suppliers::get_one::<S>)
        .patch(suppliers::update::<S>)
        .put(suppliers::update::<S>)
        .delete(suppliers::delete::<S>),
    )
    // Visits
    .route("/visits", get(visits::list::<S>).post(visits::create::<S>))
    .route("/visits/all-suppliers", post(visits::create_for_all::<S>))
    // Daily sheet and attendance
    .route("/agenda", get(agenda::handler::<S>))
    .route(
      "/attendance",
      get(attendance::list::<S>).post(attendance::record::<S>),
    )
    // Reports
    .route("/reports", get(reports::handler::<S>))
    // Backup
    .route("/admin/export", get(admin::export::<S>))
    .route("/admin/import", post(admin::import::<S>))
    .with_state(ApiState { store, horizon_days })
}
