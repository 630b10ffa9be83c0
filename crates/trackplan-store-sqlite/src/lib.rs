//! SQLite backend for the tracking-plan catalog.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A reconciliation runs entirely inside
//! one `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod schema;
mod store;
mod txn;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
