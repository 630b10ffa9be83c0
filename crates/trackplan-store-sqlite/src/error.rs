//! Error type for `trackplan-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("core error: {0}")]
  Core(#[from] trackplan_core::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its enum's domain.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },
}

impl Error {
  /// Whether SQLite rejected a write because of a UNIQUE or PRIMARY KEY
  /// constraint. CHECK, NOT NULL, foreign-key and trigger failures do not
  /// count.
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => {
        sqlite_unique(e)
      }
      _ => false,
    }
  }
}

fn sqlite_unique(err: &rusqlite::Error) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(code, message) => {
      matches!(
        code.extended_code,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
      ) || message
        .as_deref()
        .is_some_and(|m| m.contains("UNIQUE constraint failed"))
    }
    _ => false,
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
