//! `X-API-Key` extractor and standalone verifier.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use orgdir_core::store::DirectoryStore;
use subtle::ConstantTimeEq;

use crate::{AppState, error::ApiError};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Zero-size marker: present in the handler means the request carried the
/// configured API key.
pub struct Authenticated;

fn keys_match(given: &str, expected: &str) -> bool {
  given.len() == expected.len() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

/// Check the `X-API-Key` header against `expected`. A missing header is
/// rejected the same way as a wrong key.
pub fn verify_api_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
  let given = headers
    .get(API_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Forbidden)?;

  if !keys_match(given, expected) {
    tracing::debug!("rejected request with invalid API key");
    return Err(ApiError::Forbidden);
  }
  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: DirectoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_api_key(&parts.headers, &state.config.api_key)?;
    Ok(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(key: Option<&'static str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(key) = key {
      headers.insert(API_KEY_HEADER, HeaderValue::from_static(key));
    }
    headers
  }

  #[test]
  fn accepts_the_configured_key() {
    assert!(verify_api_key(&headers(Some("secret")), "secret").is_ok());
  }

  #[test]
  fn rejects_wrong_or_missing_key() {
    assert!(matches!(
      verify_api_key(&headers(Some("secrets")), "secret"),
      Err(ApiError::Forbidden)
    ));
    assert!(matches!(
      verify_api_key(&headers(Some("SECRET")), "secret"),
      Err(ApiError::Forbidden)
    ));
    assert!(matches!(verify_api_key(&headers(None), "secret"), Err(ApiError::Forbidden)));
  }
}
