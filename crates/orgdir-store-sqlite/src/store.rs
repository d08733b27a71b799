//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use orgdir_core::{
  activity::{
    Activity, ActivityIndex, ActivityNode, DEFAULT_MAX_DEPTH, NewActivity, build_tree,
    child_level,
  },
  building::{Building, NewBuilding},
  location::SpatialPredicate,
  organization::{BuildingList, NewOrganization, Organization, OrganizationList, Page},
  store::DirectoryStore,
};
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};

use crate::{
  Error, Result,
  encode::{
    ACTIVITY_COLUMNS, BUILDING_COLUMNS, ORGANIZATION_COLUMNS, RawActivity, RawBuilding,
    RawOrganization, RawOrganizationPage, encode_dt, placeholders,
  },
  schema::SCHEMA,
  spatial,
};

/// Result of a closure that may stop with a domain error. Returning it as the
/// `Ok` value of a connection call drops any open transaction, rolling it back.
type Outcome<T> = std::result::Result<T, orgdir_core::Error>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A directory store backed by a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:    tokio_rusqlite::Connection,
  max_activity_depth: u8,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn, max_activity_depth: DEFAULT_MAX_DEPTH };
    store.init_schema().await?;
    Ok(store)
  }

  /// Override the activity depth bound (default [`DEFAULT_MAX_DEPTH`]).
  pub fn with_max_activity_depth(mut self, depth: u8) -> Self {
    self.max_activity_depth = depth;
    self
  }

  pub fn max_activity_depth(&self) -> u8 { self.max_activity_depth }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        spatial::register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a filtered, paged organization query. `filter` is appended after
  /// `FROM organizations o` and binds `params` in order.
  async fn organization_page(
    &self,
    filter: String,
    params: Vec<Value>,
    page: Page,
  ) -> Result<OrganizationList> {
    let raw = self
      .conn
      .call(move |conn| Ok(load_organization_page(conn, &filter, &params, page)?))
      .await?;
    raw.into_list()
  }

  async fn all_activities(&self) -> Result<Vec<Activity>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLUMNS} FROM activities a ORDER BY a.level, a.name"
        ))?;
        let rows = stmt
          .query_map([], |row| RawActivity::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawActivity::into_activity).collect()
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

/// Count and fetch one page of organizations, then batch-load their buildings,
/// phones and activities: four queries per page regardless of its size.
fn load_organization_page(
  conn: &rusqlite::Connection,
  filter: &str,
  params: &[Value],
  page: Page,
) -> rusqlite::Result<RawOrganizationPage> {
  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM organizations o {filter}"),
    params_from_iter(params.iter()),
    |row| row.get(0),
  )?;

  let mut paged = params.to_vec();
  paged.push(Value::Integer(page.limit.into()));
  paged.push(Value::Integer(page.offset.into()));

  let mut stmt = conn.prepare(&format!(
    "SELECT {ORGANIZATION_COLUMNS} FROM organizations o {filter}
     ORDER BY o.id LIMIT ? OFFSET ?"
  ))?;
  let organizations = stmt
    .query_map(params_from_iter(paged.iter()), RawOrganization::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut raw = RawOrganizationPage {
    total,
    organizations,
    buildings: Vec::new(),
    phones: Vec::new(),
    activities: Vec::new(),
  };
  if raw.organizations.is_empty() {
    return Ok(raw);
  }

  let org_ids: Vec<Value> =
    raw.organizations.iter().map(|o| Value::Integer(o.id)).collect();
  let building_ids: Vec<Value> = raw
    .organizations
    .iter()
    .map(|o| o.building_id)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .map(Value::Integer)
    .collect();

  let mut stmt = conn.prepare(&format!(
    "SELECT {BUILDING_COLUMNS} FROM buildings b WHERE b.id IN ({})",
    placeholders(building_ids.len())
  ))?;
  raw.buildings = stmt
    .query_map(params_from_iter(building_ids.iter()), |row| RawBuilding::from_row(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT p.organization_id, p.phone_number FROM organization_phones p
     WHERE p.organization_id IN ({}) ORDER BY p.id",
    placeholders(org_ids.len())
  ))?;
  raw.phones = stmt
    .query_map(params_from_iter(org_ids.iter()), |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT oa.organization_id, {ACTIVITY_COLUMNS}
     FROM organization_activity oa JOIN activities a ON a.id = oa.activity_id
     WHERE oa.organization_id IN ({}) ORDER BY a.level, a.name",
    placeholders(org_ids.len())
  ))?;
  raw.activities = stmt
    .query_map(params_from_iter(org_ids.iter()), |row| {
      Ok((row.get(0)?, RawActivity::from_row(row, 1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(raw)
}

fn building_exists(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM buildings WHERE id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Activities ────────────────────────────────────────────────────────────

  async fn create_activity(&self, input: NewActivity) -> Result<Activity> {
    input.validate()?;

    let max_depth = self.max_activity_depth;
    let now = Utc::now();
    let at = encode_dt(now);
    let NewActivity { name, parent_id } = input;
    let name_for_insert = name.clone();

    let outcome: Outcome<(i64, u8)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let parent_level = match parent_id {
          None => None,
          Some(pid) => {
            let level: Option<i64> = tx
              .query_row("SELECT level FROM activities WHERE id = ?1", [pid], |r| r.get(0))
              .optional()?;
            match level {
              Some(l) => Some(u8::try_from(l).unwrap_or(u8::MAX)),
              None => return Ok(Err(orgdir_core::Error::activity_not_found(pid))),
            }
          }
        };

        let level = match child_level(parent_level, max_depth) {
          Ok(level) => level,
          Err(e) => return Ok(Err(e)),
        };

        let taken = tx
          .query_row(
            "SELECT 1 FROM activities WHERE name = ?1",
            [&name_for_insert],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(orgdir_core::Error::Conflict(format!(
            "activity named {name_for_insert:?} already exists"
          ))));
        }

        tx.execute(
          "INSERT INTO activities (name, parent_id, level, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![name_for_insert, parent_id, level, at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok((id, level)))
      })
      .await?;

    let (id, level) = outcome?;
    tracing::info!(id, %name, level, ?parent_id, "activity created");

    Ok(Activity { id, name, parent_id, level, created_at: now, updated_at: now })
  }

  async fn list_activities(&self, level: Option<u8>, page: Page) -> Result<Vec<Activity>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLUMNS} FROM activities a
           WHERE (?1 IS NULL OR a.level = ?1)
           ORDER BY a.level, a.name
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![level, page.limit, page.offset], |row| {
            RawActivity::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  async fn activity_tree(&self) -> Result<Vec<ActivityNode>> {
    Ok(build_tree(&self.all_activities().await?))
  }

  async fn activity_subtree(&self, id: i64) -> Result<Option<ActivityNode>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "WITH RECURSIVE subtree(id) AS (
             SELECT id FROM activities WHERE id = ?1
             UNION
             SELECT c.id FROM activities c JOIN subtree s ON c.parent_id = s.id
           )
           SELECT {ACTIVITY_COLUMNS} FROM activities a JOIN subtree USING (id)
           ORDER BY a.level, a.name"
        ))?;
        let rows = stmt
          .query_map([id], |row| RawActivity::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let activities = raws
      .into_iter()
      .map(RawActivity::into_activity)
      .collect::<Result<Vec<_>>>()?;

    Ok(build_tree(&activities).into_iter().find(|node| node.activity.id == id))
  }

  async fn descendant_activity_ids(&self, id: i64) -> Result<Option<BTreeSet<i64>>> {
    let links: Vec<(i64, Option<i64>)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, parent_id FROM activities")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if !links.iter().any(|&(activity_id, _)| activity_id == id) {
      return Ok(None);
    }
    Ok(Some(ActivityIndex::from_links(links).descendant_ids(id)))
  }

  // ── Buildings ─────────────────────────────────────────────────────────────

  async fn create_building(&self, input: NewBuilding) -> Result<Building> {
    input.validate()?;

    let now = Utc::now();
    let at = encode_dt(now);
    let NewBuilding { address, latitude, longitude } = input;
    let address_for_insert = address.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO buildings (address, longitude, latitude, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![address_for_insert, longitude, latitude, at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::info!(id, %address, latitude, longitude, "building created");
    Ok(Building { id, address, latitude, longitude, created_at: now, updated_at: now })
  }

  async fn get_building(&self, id: i64) -> Result<Option<Building>> {
    let raw: Option<RawBuilding> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BUILDING_COLUMNS} FROM buildings b WHERE b.id = ?1"),
              [id],
              |row| RawBuilding::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBuilding::into_building).transpose()
  }

  async fn list_buildings(&self, page: Page) -> Result<BuildingList> {
    let (total, raws): (i64, Vec<RawBuilding>) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM buildings", [], |row| row.get(0))?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {BUILDING_COLUMNS} FROM buildings b ORDER BY b.id LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![page.limit, page.offset], |row| {
            RawBuilding::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    Ok(BuildingList {
      buildings: raws
        .into_iter()
        .map(RawBuilding::into_building)
        .collect::<Result<_>>()?,
      total:     u64::try_from(total).unwrap_or_default(),
    })
  }

  // ── Organizations ─────────────────────────────────────────────────────────

  async fn create_organization(&self, input: NewOrganization) -> Result<Organization> {
    input.validate()?;

    let at = encode_dt(Utc::now());
    let NewOrganization { name, building_id, phone_numbers, activity_ids } = input;
    let activity_ids: BTreeSet<i64> = activity_ids.into_iter().collect();
    // Bound as one JSON array parameter; the id list has no size limit.
    let activity_ids_json = serde_json::to_string(&activity_ids)?;

    let outcome: Outcome<RawOrganizationPage> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !building_exists(&tx, building_id)? {
          return Ok(Err(orgdir_core::Error::building_not_found(building_id)));
        }

        if !activity_ids.is_empty() {
          let mut stmt = tx.prepare(
            "SELECT id FROM activities WHERE id IN (SELECT value FROM json_each(?1))",
          )?;
          let found = stmt
            .query_map([&activity_ids_json], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
          drop(stmt);
          let missing: Vec<i64> = activity_ids.difference(&found).copied().collect();
          if !missing.is_empty() {
            return Ok(Err(orgdir_core::Error::MissingActivities(missing)));
          }
        }

        tx.execute(
          "INSERT INTO organizations (name, building_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)",
          rusqlite::params![name, building_id, at],
        )?;
        let id = tx.last_insert_rowid();

        for phone_number in &phone_numbers {
          tx.execute(
            "INSERT INTO organization_phones (organization_id, phone_number) VALUES (?1, ?2)",
            rusqlite::params![id, phone_number],
          )?;
        }
        for activity_id in &activity_ids {
          tx.execute(
            "INSERT INTO organization_activity (organization_id, activity_id) VALUES (?1, ?2)",
            rusqlite::params![id, activity_id],
          )?;
        }

        let raw = load_organization_page(
          &tx,
          "WHERE o.id = ?",
          &[Value::Integer(id)],
          Page::new(1, 0),
        )?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    let organization = outcome?
      .into_list()?
      .organizations
      .into_iter()
      .next()
      .ok_or_else(|| Error::Decode("created organization could not be read back".into()))?;

    tracing::info!(
      id = organization.id,
      name = %organization.name,
      building_id = organization.building_id,
      phones = organization.phone_numbers.len(),
      activities = organization.activities.len(),
      "organization created"
    );
    Ok(organization)
  }

  async fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
    let list = self
      .organization_page("WHERE o.id = ?".into(), vec![Value::Integer(id)], Page::new(1, 0))
      .await?;
    Ok(list.organizations.into_iter().next())
  }

  async fn list_organizations(&self, page: Page) -> Result<OrganizationList> {
    self.organization_page(String::new(), Vec::new(), page).await
  }

  async fn organizations_by_building(
    &self,
    building_id: i64,
    page: Page,
  ) -> Result<OrganizationList> {
    if self.get_building(building_id).await?.is_none() {
      return Err(orgdir_core::Error::building_not_found(building_id).into());
    }
    self
      .organization_page(
        "WHERE o.building_id = ?".into(),
        vec![Value::Integer(building_id)],
        page,
      )
      .await
  }

  async fn organizations_by_activity(
    &self,
    activity_id: i64,
    page: Page,
  ) -> Result<OrganizationList> {
    let ids = self
      .descendant_activity_ids(activity_id)
      .await?
      .ok_or_else(|| orgdir_core::Error::activity_not_found(activity_id))?;
    tracing::debug!(activity_id, expanded = ids.len(), "expanded activity filter");

    // The descendant set can be wider than SQLite's bound-variable limit, so
    // it travels as a single JSON array.
    let filter = "WHERE o.id IN (
         SELECT oa.organization_id FROM organization_activity oa
         WHERE oa.activity_id IN (SELECT value FROM json_each(?))
       )"
    .to_string();
    let params = vec![Value::Text(serde_json::to_string(&ids)?)];
    self.organization_page(filter, params, page).await
  }

  async fn search_organizations_by_name(
    &self,
    name: String,
    page: Page,
  ) -> Result<OrganizationList> {
    if name.is_empty() {
      return Err(orgdir_core::Error::Validation("name must not be empty".into()).into());
    }
    self
      .organization_page(
        "WHERE instr(casefold(o.name), ?) > 0".into(),
        vec![Value::Text(name.to_lowercase())],
        page,
      )
      .await
  }

  async fn search_organizations_by_location(
    &self,
    predicate: SpatialPredicate,
    page: Page,
  ) -> Result<OrganizationList> {
    let (condition, params) =
      spatial::predicate_sql(&predicate, "b.longitude", "b.latitude")?;
    tracing::debug!(mode = predicate.mode(), "location search");
    let filter = format!(
      "WHERE o.building_id IN (SELECT b.id FROM buildings b WHERE {condition})"
    );
    self.organization_page(filter, params, page).await
  }
}
