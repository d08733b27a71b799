//! Error type for `orgdir-store-sqlite`.

use orgdir_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] orgdir_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value could not be turned back into a domain value.
  #[error("invalid stored value: {0}")]
  Decode(String),
}

impl Error {
  fn is_unique_violation(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
      _ => false,
    }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      e if e.is_unique_violation() => ErrorKind::Conflict,
      _ => ErrorKind::Unexpected,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
