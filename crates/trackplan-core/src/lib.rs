//! Core types and trait definitions for the tracking-plan catalog.
//!
//! This crate has no HTTP or database dependencies. The
//! reconciler is written against [`reconcile::CatalogTx`], a synchronous view
//! of one open transaction; backends provide it and wrap the commit/rollback.

pub mod catalog;
pub mod conflict;
pub mod error;
pub mod owner;
pub mod reconcile;
pub mod resolve;
pub mod store;
pub mod submission;

pub use conflict::{Conflict, ReconcileError};
pub use error::{Error, Result};
pub use owner::OwnerId;
