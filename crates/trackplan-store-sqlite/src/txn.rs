//! [`SqliteCatalogTx`]: [`CatalogTx`] over one open rusqlite transaction.
//!
//! Runs on the `tokio_rusqlite` connection thread; every method is a single
//! point read or write.

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Transaction, params};
use trackplan_core::{
  OwnerId,
  catalog::{
    Event, EventType, NewEvent, NewProperty, PlanEvent, PlanEventProperty,
    Property, PropertyType, TrackingPlan,
  },
  reconcile::CatalogTx,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawEvent, RawPlan, RawPlanEvent, RawPlanEventProperty, RawProperty,
    encode_dt, encode_event_type, encode_property_type, encode_uuid,
  },
};

pub struct SqliteCatalogTx<'t, 'c> {
  tx: &'t Transaction<'c>,
}

impl<'t, 'c> SqliteCatalogTx<'t, 'c> {
  pub fn new(tx: &'t Transaction<'c>) -> Self { Self { tx } }
}

impl CatalogTx for SqliteCatalogTx<'_, '_> {
  type Error = Error;

  // ── Plans ─────────────────────────────────────────────────────────────────

  fn find_plan(&mut self, owner: &OwnerId, name: &str) -> Result<Option<TrackingPlan>> {
    let raw = self
      .tx
      .query_row(
        &format!(
          "SELECT {} FROM tracking_plans WHERE name = ?1 AND owner_id = ?2",
          RawPlan::COLUMNS
        ),
        params![name, owner.as_str()],
        RawPlan::from_row,
      )
      .optional()?;
    raw.map(RawPlan::into_plan).transpose()
  }

  fn upsert_plan(
    &mut self,
    owner: &OwnerId,
    name: &str,
    description: Option<&str>,
  ) -> Result<TrackingPlan> {
    if let Some(plan) = self.find_plan(owner, name)? {
      return Ok(plan);
    }

    let plan = TrackingPlan {
      id:          Uuid::new_v4(),
      name:        name.to_owned(),
      description: description.map(str::to_owned),
      owner_id:    owner.clone(),
      created_at:  Utc::now(),
    };
    self.tx.execute(
      "INSERT INTO tracking_plans (id, name, description, owner_id, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(plan.id),
        plan.name,
        plan.description,
        owner.as_str(),
        encode_dt(plan.created_at),
      ],
    )?;
    Ok(plan)
  }

  // ── Events ────────────────────────────────────────────────────────────────

  fn find_events(
    &mut self,
    owner: &OwnerId,
    name: &str,
    event_type: Option<EventType>,
  ) -> Result<Vec<Event>> {
    let mut stmt = self.tx.prepare_cached(&format!(
      "SELECT {} FROM events
       WHERE name = ?1 AND owner_id = ?2 AND (?3 IS NULL OR event_type = ?3)
       ORDER BY created_at, rowid",
      RawEvent::COLUMNS
    ))?;
    let raws = stmt
      .query_map(
        params![name, owner.as_str(), event_type.map(encode_event_type)],
        RawEvent::from_row,
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawEvent::into_event).collect()
  }

  fn create_event(&mut self, owner: &OwnerId, input: NewEvent) -> Result<Event> {
    let event = Event {
      id:          Uuid::new_v4(),
      name:        input.name,
      event_type:  input.event_type,
      description: input.description,
      owner_id:    owner.clone(),
      created_at:  Utc::now(),
    };
    self.tx.execute(
      "INSERT INTO events (id, name, event_type, description, owner_id, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(event.id),
        event.name,
        encode_event_type(event.event_type),
        event.description,
        owner.as_str(),
        encode_dt(event.created_at),
      ],
    )?;
    Ok(event)
  }

  // ── Plan/event links ──────────────────────────────────────────────────────

  fn find_plan_event(&mut self, plan_id: Uuid, event_id: Uuid) -> Result<Option<PlanEvent>> {
    let raw = self
      .tx
      .query_row(
        &format!(
          "SELECT {} FROM plan_events WHERE tracking_plan_id = ?1 AND event_id = ?2",
          RawPlanEvent::COLUMNS
        ),
        params![encode_uuid(plan_id), encode_uuid(event_id)],
        RawPlanEvent::from_row,
      )
      .optional()?;
    raw.map(RawPlanEvent::into_plan_event).transpose()
  }

  fn create_plan_event(
    &mut self,
    plan_id: Uuid,
    event_id: Uuid,
    additional_properties: bool,
  ) -> Result<PlanEvent> {
    let link = PlanEvent {
      id: Uuid::new_v4(),
      tracking_plan_id: plan_id,
      event_id,
      additional_properties,
      created_at: Utc::now(),
    };
    self.tx.execute(
      "INSERT INTO plan_events (id, tracking_plan_id, event_id, additional_properties, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(link.id),
        encode_uuid(plan_id),
        encode_uuid(event_id),
        additional_properties,
        encode_dt(link.created_at),
      ],
    )?;
    Ok(link)
  }

  // ── Properties ────────────────────────────────────────────────────────────

  fn find_property(
    &mut self,
    owner: &OwnerId,
    name: &str,
    property_type: PropertyType,
  ) -> Result<Option<Property>> {
    let raw = self
      .tx
      .query_row(
        &format!(
          "SELECT {} FROM properties
           WHERE name = ?1 AND property_type = ?2 AND owner_id = ?3",
          RawProperty::COLUMNS
        ),
        params![name, encode_property_type(property_type), owner.as_str()],
        RawProperty::from_row,
      )
      .optional()?;
    raw.map(RawProperty::into_property).transpose()
  }

  fn create_property(&mut self, owner: &OwnerId, input: NewProperty) -> Result<Property> {
    let property = Property {
      id:            Uuid::new_v4(),
      name:          input.name,
      property_type: input.property_type,
      description:   input.description,
      owner_id:      owner.clone(),
      created_at:    Utc::now(),
    };
    self.tx.execute(
      "INSERT INTO properties (id, name, property_type, description, owner_id, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(property.id),
        property.name,
        encode_property_type(property.property_type),
        property.description,
        owner.as_str(),
        encode_dt(property.created_at),
      ],
    )?;
    Ok(property)
  }

  // ── Event/property links ──────────────────────────────────────────────────

  fn find_property_associations(&mut self, property_id: Uuid) -> Result<Vec<PlanEventProperty>> {
    let mut stmt = self.tx.prepare_cached(&format!(
      "SELECT {} FROM plan_event_properties WHERE property_id = ?1",
      RawPlanEventProperty::COLUMNS
    ))?;
    let raws = stmt
      .query_map(params![encode_uuid(property_id)], RawPlanEventProperty::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawPlanEventProperty::into_link).collect()
  }

  fn find_plan_event_property(
    &mut self,
    plan_event_id: Uuid,
    property_id: Uuid,
  ) -> Result<Option<PlanEventProperty>> {
    let raw = self
      .tx
      .query_row(
        &format!(
          "SELECT {} FROM plan_event_properties
           WHERE plan_event_id = ?1 AND property_id = ?2",
          RawPlanEventProperty::COLUMNS
        ),
        params![encode_uuid(plan_event_id), encode_uuid(property_id)],
        RawPlanEventProperty::from_row,
      )
      .optional()?;
    raw.map(RawPlanEventProperty::into_link).transpose()
  }

  fn create_plan_event_property(
    &mut self,
    plan_event_id: Uuid,
    property_id: Uuid,
    required: bool,
  ) -> Result<PlanEventProperty> {
    let link = PlanEventProperty {
      id: Uuid::new_v4(),
      plan_event_id,
      property_id,
      required,
      created_at: Utc::now(),
    };
    self.tx.execute(
      "INSERT INTO plan_event_properties (id, plan_event_id, property_id, required, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(link.id),
        encode_uuid(plan_event_id),
        encode_uuid(property_id),
        required,
        encode_dt(link.created_at),
      ],
    )?;
    Ok(link)
  }
}
