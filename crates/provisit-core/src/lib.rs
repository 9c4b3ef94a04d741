//! Core types and scheduling logic for the provisit supplier-visit tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! workflows in [`reconcile`], [`attendance`], [`registry`], [`agenda`] and
//! [`report`] are generic over any [`store::VisitStore`] backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod agenda;
pub mod attendance;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod schedule;
pub mod store;
pub mod supplier;
pub mod visit;
pub mod visit_type;

pub use error::{Error, ErrorKind, Result};
