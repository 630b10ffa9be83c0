//! Error types for `trackplan-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The submission is structurally unusable (e.g. a blank name).
  #[error("invalid submission: {0}")]
  Validation(String),

  #[error("owner id must not be empty")]
  EmptyOwner,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
