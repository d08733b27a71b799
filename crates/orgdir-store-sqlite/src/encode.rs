//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; ids are SQLite rowids; building
//! points are two `REAL` columns (longitude, latitude).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use orgdir_core::{
  activity::Activity,
  building::Building,
  organization::{Organization, OrganizationList, OrganizationPhone},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SQL fragments ───────────────────────────────────────────────────────────

/// `?, ?, ?` with `n` anonymous placeholders.
pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

pub const ACTIVITY_COLUMNS: &str =
  "a.id, a.name, a.parent_id, a.level, a.created_at, a.updated_at";

pub const BUILDING_COLUMNS: &str =
  "b.id, b.address, b.latitude, b.longitude, b.created_at, b.updated_at";

pub const ORGANIZATION_COLUMNS: &str =
  "o.id, o.name, o.building_id, o.created_at, o.updated_at";

// ─── Activity rows ───────────────────────────────────────────────────────────

/// Raw values read from an `activities` row.
pub struct RawActivity {
  pub id:         i64,
  pub name:       String,
  pub parent_id:  Option<i64>,
  pub level:      i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawActivity {
  /// Read [`ACTIVITY_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(at)?,
      name:       row.get(at + 1)?,
      parent_id:  row.get(at + 2)?,
      level:      row.get(at + 3)?,
      created_at: row.get(at + 4)?,
      updated_at: row.get(at + 5)?,
    })
  }

  pub fn into_activity(self) -> Result<Activity> {
    let level = u8::try_from(self.level)
      .map_err(|_| Error::Decode(format!("activity level {} out of range", self.level)))?;
    Ok(Activity {
      id: self.id,
      name: self.name,
      parent_id: self.parent_id,
      level,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Building rows ───────────────────────────────────────────────────────────

/// Raw values read from a `buildings` row.
pub struct RawBuilding {
  pub id:         i64,
  pub address:    String,
  pub latitude:   f64,
  pub longitude:  f64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawBuilding {
  /// Read [`BUILDING_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(at)?,
      address:    row.get(at + 1)?,
      latitude:   row.get(at + 2)?,
      longitude:  row.get(at + 3)?,
      created_at: row.get(at + 4)?,
      updated_at: row.get(at + 5)?,
    })
  }

  pub fn into_building(self) -> Result<Building> {
    Ok(Building {
      id:         self.id,
      address:    self.address,
      latitude:   self.latitude,
      longitude:  self.longitude,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Organization rows ───────────────────────────────────────────────────────

/// Raw values read from an `organizations` row.
pub struct RawOrganization {
  pub id:          i64,
  pub name:        String,
  pub building_id: i64,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawOrganization {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      building_id: row.get(2)?,
      created_at:  row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }
}

/// One page of organizations with every related row needed to assemble them.
pub struct RawOrganizationPage {
  pub total:         i64,
  pub organizations: Vec<RawOrganization>,
  pub buildings:     Vec<RawBuilding>,
  /// `(organization_id, phone_number)` in insertion order.
  pub phones:        Vec<(i64, String)>,
  /// `(organization_id, activity)` ordered by level, then name.
  pub activities:    Vec<(i64, RawActivity)>,
}

impl RawOrganizationPage {
  pub fn into_list(self) -> Result<OrganizationList> {
    let mut buildings = HashMap::with_capacity(self.buildings.len());
    for raw in self.buildings {
      let building = raw.into_building()?;
      buildings.insert(building.id, building);
    }

    let mut phones: HashMap<i64, Vec<OrganizationPhone>> = HashMap::new();
    for (org_id, phone_number) in self.phones {
      phones.entry(org_id).or_default().push(OrganizationPhone { phone_number });
    }

    let mut activities: HashMap<i64, Vec<Activity>> = HashMap::new();
    for (org_id, raw) in self.activities {
      activities.entry(org_id).or_default().push(raw.into_activity()?);
    }

    let organizations = self
      .organizations
      .into_iter()
      .map(|raw| {
        let building = buildings.get(&raw.building_id).cloned().ok_or_else(|| {
          Error::Decode(format!(
            "organization {} references missing building {}",
            raw.id, raw.building_id
          ))
        })?;
        Ok(Organization {
          id: raw.id,
          name: raw.name,
          building_id: raw.building_id,
          building,
          phone_numbers: phones.remove(&raw.id).unwrap_or_default(),
          activities: activities.remove(&raw.id).unwrap_or_default(),
          created_at: decode_dt(&raw.created_at)?,
          updated_at: decode_dt(&raw.updated_at)?,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(OrganizationList {
      organizations,
      total: u64::try_from(self.total).unwrap_or_default(),
    })
  }
}
