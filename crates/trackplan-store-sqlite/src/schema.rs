//! SQL schema for the tracking-plan SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tracking_plans (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    owner_id    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (name, owner_id)
);

CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    event_type  TEXT NOT NULL
                CHECK (event_type IN ('track', 'identify', 'alias', 'screen', 'page')),
    description TEXT NOT NULL,
    owner_id    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (name, event_type, owner_id)
);

CREATE TABLE IF NOT EXISTS properties (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    property_type TEXT NOT NULL
                  CHECK (property_type IN ('string', 'number', 'boolean')),
    description   TEXT NOT NULL,
    owner_id      TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE (name, property_type, owner_id)
);

-- A plan lists each event at most once.
CREATE TABLE IF NOT EXISTS plan_events (
    id                    TEXT PRIMARY KEY,
    tracking_plan_id      TEXT NOT NULL REFERENCES tracking_plans(id),
    event_id              TEXT NOT NULL REFERENCES events(id),
    additional_properties INTEGER NOT NULL,
    created_at            TEXT NOT NULL,
    UNIQUE (tracking_plan_id, event_id)
);

CREATE TABLE IF NOT EXISTS plan_event_properties (
    id            TEXT PRIMARY KEY,
    plan_event_id TEXT NOT NULL REFERENCES plan_events(id),
    property_id   TEXT NOT NULL REFERENCES properties(id),
    required      INTEGER NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE (plan_event_id, property_id)
);

CREATE INDEX IF NOT EXISTS events_owner_name_idx     ON events(owner_id, name);
CREATE INDEX IF NOT EXISTS properties_owner_name_idx ON properties(owner_id, name);
CREATE INDEX IF NOT EXISTS pep_property_idx          ON plan_event_properties(property_id);

PRAGMA user_version = 1;
";
