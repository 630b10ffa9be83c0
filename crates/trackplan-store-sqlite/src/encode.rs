//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with microseconds, UUIDs as
//! hyphenated lowercase strings, enums as their lowercase names and flags as
//! `0`/`1` integers.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use trackplan_core::{
  OwnerId,
  catalog::{
    Event, EventType, PlanEvent, PlanEventProperty, Property, PropertyType,
    TrackingPlan,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width, so text order is chronological order.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Kinds ───────────────────────────────────────────────────────────────────

pub fn encode_event_type(t: EventType) -> &'static str { t.into() }

pub fn decode_event_type(s: &str) -> Result<EventType> {
  EventType::from_str(s).map_err(|_| Error::UnknownVariant {
    column: "event_type",
    value:  s.to_owned(),
  })
}

pub fn encode_property_type(t: PropertyType) -> &'static str { t.into() }

pub fn decode_property_type(s: &str) -> Result<PropertyType> {
  PropertyType::from_str(s).map_err(|_| Error::UnknownVariant {
    column: "property_type",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `tracking_plans` row.
pub struct RawPlan {
  pub id:          String,
  pub name:        String,
  pub description: Option<String>,
  pub owner_id:    String,
  pub created_at:  String,
}

impl RawPlan {
  pub const COLUMNS: &'static str = "id, name, description, owner_id, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      owner_id:    row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_plan(self) -> Result<TrackingPlan> {
    Ok(TrackingPlan {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      description: self.description,
      owner_id:    OwnerId::new(self.owner_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub id:          String,
  pub name:        String,
  pub event_type:  String,
  pub description: String,
  pub owner_id:    String,
  pub created_at:  String,
}

impl RawEvent {
  pub const COLUMNS: &'static str =
    "id, name, event_type, description, owner_id, created_at";

  /// Read the six event columns starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(offset)?,
      name:        row.get(offset + 1)?,
      event_type:  row.get(offset + 2)?,
      description: row.get(offset + 3)?,
      owner_id:    row.get(offset + 4)?,
      created_at:  row.get(offset + 5)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      event_type:  decode_event_type(&self.event_type)?,
      description: self.description,
      owner_id:    OwnerId::new(self.owner_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `properties` row.
pub struct RawProperty {
  pub id:            String,
  pub name:          String,
  pub property_type: String,
  pub description:   String,
  pub owner_id:      String,
  pub created_at:    String,
}

impl RawProperty {
  pub const COLUMNS: &'static str =
    "id, name, property_type, description, owner_id, created_at";

  /// Read the six property columns starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(offset)?,
      name:          row.get(offset + 1)?,
      property_type: row.get(offset + 2)?,
      description:   row.get(offset + 3)?,
      owner_id:      row.get(offset + 4)?,
      created_at:    row.get(offset + 5)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      id:            decode_uuid(&self.id)?,
      name:          self.name,
      property_type: decode_property_type(&self.property_type)?,
      description:   self.description,
      owner_id:      OwnerId::new(self.owner_id)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `plan_events` row.
pub struct RawPlanEvent {
  pub id:                    String,
  pub tracking_plan_id:      String,
  pub event_id:              String,
  pub additional_properties: bool,
  pub created_at:            String,
}

impl RawPlanEvent {
  pub const COLUMNS: &'static str =
    "id, tracking_plan_id, event_id, additional_properties, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      tracking_plan_id:      row.get(1)?,
      event_id:              row.get(2)?,
      additional_properties: row.get(3)?,
      created_at:            row.get(4)?,
    })
  }

  pub fn into_plan_event(self) -> Result<PlanEvent> {
    Ok(PlanEvent {
      id:                    decode_uuid(&self.id)?,
      tracking_plan_id:      decode_uuid(&self.tracking_plan_id)?,
      event_id:              decode_uuid(&self.event_id)?,
      additional_properties: self.additional_properties,
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `plan_event_properties` row.
pub struct RawPlanEventProperty {
  pub id:            String,
  pub plan_event_id: String,
  pub property_id:   String,
  pub required:      bool,
  pub created_at:    String,
}

impl RawPlanEventProperty {
  pub const COLUMNS: &'static str =
    "id, plan_event_id, property_id, required, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      plan_event_id: row.get(1)?,
      property_id:   row.get(2)?,
      required:      row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_link(self) -> Result<PlanEventProperty> {
    Ok(PlanEventProperty {
      id:            decode_uuid(&self.id)?,
      plan_event_id: decode_uuid(&self.plan_event_id)?,
      property_id:   decode_uuid(&self.property_id)?,
      required:      self.required,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_roundtrip_through_column_text() {
    for t in [
      EventType::Track,
      EventType::Identify,
      EventType::Alias,
      EventType::Screen,
      EventType::Page,
    ] {
      assert_eq!(decode_event_type(encode_event_type(t)).unwrap(), t);
    }
    assert_eq!(encode_property_type(PropertyType::Boolean), "boolean");
    assert!(matches!(
      decode_property_type("integer"),
      Err(Error::UnknownVariant { column: "property_type", .. })
    ));
  }
}
