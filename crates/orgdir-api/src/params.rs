//! Query-string parameters shared by the listing endpoints.
//!
//! Fields are spelled out per struct rather than flattened: query strings are
//! all text and only direct fields get their numbers parsed.

use orgdir_core::organization::{DEFAULT_LIMIT, Page};
use serde::Deserialize;

use crate::error::ApiError;

fn page(limit: Option<u32>, offset: Option<u32>) -> Result<Page, ApiError> {
  let page = Page::new(limit.unwrap_or(DEFAULT_LIMIT), offset.unwrap_or(0));
  page.validate()?;
  Ok(page)
}

/// `?limit=&offset=`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl PageParams {
  pub fn page(&self) -> Result<Page, ApiError> { page(self.limit, self.offset) }
}

/// `?level=&limit=&offset=`
#[derive(Debug, Default, Deserialize)]
pub struct ActivityListParams {
  pub level:  Option<u8>,
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl ActivityListParams {
  pub fn page(&self) -> Result<Page, ApiError> { page(self.limit, self.offset) }
}

/// `?name=&limit=&offset=`
#[derive(Debug, Deserialize)]
pub struct NameSearchParams {
  pub name:   String,
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl NameSearchParams {
  pub fn page(&self) -> Result<Page, ApiError> { page(self.limit, self.offset) }
}
