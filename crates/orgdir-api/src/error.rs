//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"kind": "...", "error": "..."}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use orgdir_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Conflict(String),

  #[error("invalid API key")]
  Forbidden,

  #[error("store error: {0}")]
  Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto a response class by its [`ErrorKind`].
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::Validation => Self::Validation(e.to_string()),
      ErrorKind::Conflict => Self::Conflict(e.to_string()),
      ErrorKind::Unexpected => Self::Unexpected(Box::new(e)),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound.as_str(),
      Self::Validation(_) => ErrorKind::Validation.as_str(),
      Self::Conflict(_) => ErrorKind::Conflict.as_str(),
      Self::Forbidden => "auth",
      Self::Unexpected(_) => ErrorKind::Unexpected.as_str(),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<orgdir_core::Error> for ApiError {
  fn from(e: orgdir_core::Error) -> Self { Self::from_store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      ApiError::Unexpected(source) => {
        tracing::error!(error = %source, "unexpected error while handling request");
        "internal server error".to_string()
      }
      other => other.to_string(),
    };
    (self.status(), Json(json!({ "kind": self.kind(), "error": message }))).into_response()
  }
}
