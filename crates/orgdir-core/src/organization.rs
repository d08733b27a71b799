//! Organizations, their phone numbers, and the paginated listings that carry
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, activity::Activity, building::Building};

/// A phone number owned by exactly one organization. Stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPhone {
  pub phone_number: String,
}

/// An organization with its building, phones and activities loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
  pub id:            i64,
  pub name:          String,
  pub building_id:   i64,
  pub building:      Building,
  pub phone_numbers: Vec<OrganizationPhone>,
  /// Shared references; the organization does not own these.
  pub activities:    Vec<Activity>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::create_organization`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
  pub name:          String,
  pub building_id:   i64,
  #[serde(default)]
  pub phone_numbers: Vec<String>,
  #[serde(default)]
  pub activity_ids:  Vec<i64>,
}

impl NewOrganization {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("organization name must not be empty".into()));
    }
    if self.phone_numbers.iter().any(|p| p.trim().is_empty()) {
      return Err(Error::Validation("phone numbers must not be empty".into()));
    }
    Ok(())
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// A `limit`/`offset` window applied after filtering and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  #[serde(default = "default_limit")]
  pub limit:  u32,
  #[serde(default)]
  pub offset: u32,
}

fn default_limit() -> u32 { DEFAULT_LIMIT }

impl Default for Page {
  fn default() -> Self { Self { limit: DEFAULT_LIMIT, offset: 0 } }
}

impl Page {
  pub fn new(limit: u32, offset: u32) -> Self { Self { limit, offset } }

  pub fn validate(&self) -> Result<()> {
    if !(1..=MAX_LIMIT).contains(&self.limit) {
      return Err(Error::Validation(format!(
        "limit must be between 1 and {MAX_LIMIT}"
      )));
    }
    Ok(())
  }
}

/// One page of organizations plus the number of matches before paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationList {
  pub organizations: Vec<Organization>,
  pub total:         u64,
}

/// One page of buildings plus the number of buildings before paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingList {
  pub buildings: Vec<Building>,
  pub total:     u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_defaults() {
    let page: Page = serde_json::from_str("{}").unwrap();
    assert_eq!(page, Page::default());
    assert_eq!(page.limit, 100);
  }

  #[test]
  fn page_limit_bounds() {
    assert!(Page::new(0, 0).validate().is_err());
    assert!(Page::new(1001, 0).validate().is_err());
    assert!(Page::new(1000, 5).validate().is_ok());
  }

  #[test]
  fn new_organization_rejects_blank_phone() {
    let org = NewOrganization {
      name:          "Horns & Hooves".into(),
      building_id:   1,
      phone_numbers: vec!["2-222-222".into(), " ".into()],
      activity_ids:  vec![],
    };
    assert!(org.validate().is_err());
  }
}
