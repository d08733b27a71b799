//! Buildings: the physical locations organizations live in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, location::Coordinates};

/// A building with its point decomposed into scalar coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
  pub id:         i64,
  pub address:    String,
  pub latitude:   f64,
  pub longitude:  f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::create_building`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBuilding {
  pub address:   String,
  pub latitude:  f64,
  pub longitude: f64,
}

impl NewBuilding {
  pub fn validate(&self) -> Result<()> {
    if self.address.trim().is_empty() {
      return Err(Error::Validation("address must not be empty".into()));
    }
    Coordinates { latitude: self.latitude, longitude: self.longitude }.validate()
  }
}
