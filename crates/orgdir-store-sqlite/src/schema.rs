//! SQL schema for the directory SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The activity forest. Depth is bounded by the store configuration, so only
-- the lower bound and the root/level pairing are enforced here.
CREATE TABLE IF NOT EXISTS activities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL UNIQUE,
    parent_id   INTEGER REFERENCES activities(id) ON DELETE CASCADE,
    level       INTEGER NOT NULL CHECK (level >= 1),
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL,
    CHECK ((parent_id IS NULL) = (level = 1))
);

-- One SRID 4326 point per building.
CREATE TABLE IF NOT EXISTS buildings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    address     TEXT    NOT NULL,
    longitude   REAL    NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    latitude    REAL    NOT NULL CHECK (latitude  BETWEEN  -90 AND  90),
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS organizations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    building_id INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS organization_phones (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    phone_number    TEXT    NOT NULL CHECK (phone_number <> '')
);

CREATE TABLE IF NOT EXISTS organization_activity (
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    activity_id     INTEGER NOT NULL REFERENCES activities(id)    ON DELETE CASCADE,
    PRIMARY KEY (organization_id, activity_id)
);

CREATE INDEX IF NOT EXISTS activities_parent_idx        ON activities(parent_id);
CREATE INDEX IF NOT EXISTS activities_level_name_idx    ON activities(level, name);
CREATE INDEX IF NOT EXISTS buildings_point_idx          ON buildings(longitude, latitude);
CREATE INDEX IF NOT EXISTS organizations_building_idx   ON organizations(building_id);
CREATE INDEX IF NOT EXISTS organizations_name_idx       ON organizations(name);
CREATE INDEX IF NOT EXISTS organization_phones_org_idx  ON organization_phones(organization_id);
CREATE INDEX IF NOT EXISTS organization_activity_act_idx ON organization_activity(activity_id);

PRAGMA user_version = 1;
";
