//! Error types for `orgdir-core`.

use thiserror::Error;

/// Stable, machine-readable classification of a failure.
///
/// Every store backend maps its own error type onto one of these kinds via
/// [`Classify`], so the HTTP layer can pick a status code without knowing the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A referenced entity does not exist.
  NotFound,
  /// Malformed or contradictory input.
  Validation,
  /// A uniqueness constraint would be violated.
  Conflict,
  /// Anything else.
  Unexpected,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotFound => "not_found",
      Self::Validation => "validation",
      Self::Conflict => "conflict",
      Self::Unexpected => "unexpected",
    }
  }
}

/// Implemented by every error type that can cross the store boundary.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  #[error("activities with ids {0:?} not found")]
  MissingActivities(Vec<i64>),

  #[error("activity depth exceeded: level {level} is above the maximum of {max}")]
  DepthExceeded { level: u8, max: u8 },

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Conflict(String),
}

impl Error {
  pub fn activity_not_found(id: i64) -> Self {
    Self::NotFound { entity: "activity", id }
  }

  pub fn building_not_found(id: i64) -> Self {
    Self::NotFound { entity: "building", id }
  }

  pub fn organization_not_found(id: i64) -> Self {
    Self::NotFound { entity: "organization", id }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound { .. } | Self::MissingActivities(_) => ErrorKind::NotFound,
      Self::DepthExceeded { .. } | Self::Validation(_) => ErrorKind::Validation,
      Self::Conflict(_) => ErrorKind::Conflict,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
