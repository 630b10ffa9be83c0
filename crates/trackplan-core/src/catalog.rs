//! Catalog entities: plans, events, properties and the two association
//! records that link them.
//!
//! Every entity belongs to exactly one owner. Identity rules:
//!
//! - a [`TrackingPlan`] is unique on `(name, owner)`;
//! - an [`Event`] is unique on `(name, type, owner)`;
//! - a [`Property`] is unique on `(name, type, owner)`;
//! - a [`PlanEvent`] is unique on `(plan, event)`;
//! - a [`PlanEventProperty`] is unique on `(plan_event, property)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::owner::OwnerId;

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The call an analytics event is emitted through.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
  /// Used when a submission leaves the type unspecified and no event of that
  /// name exists yet.
  #[default]
  Track,
  Identify,
  Alias,
  Screen,
  Page,
}

/// The value type of an event property.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyType {
  String,
  Number,
  Boolean,
}

// ─── Primary entities ────────────────────────────────────────────────────────

/// A named bundle of events. Events are attached through [`PlanEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingPlan {
  pub id:          Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub owner_id:    OwnerId,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:          Uuid,
  pub name:        String,
  #[serde(rename = "type")]
  pub event_type:  EventType,
  pub description: String,
  pub owner_id:    OwnerId,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  pub id:            Uuid,
  pub name:          String,
  #[serde(rename = "type")]
  pub property_type: PropertyType,
  pub description:   String,
  pub owner_id:      OwnerId,
  pub created_at:    DateTime<Utc>,
}

// ─── Association records ─────────────────────────────────────────────────────

/// Links one plan to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEvent {
  pub id:                    Uuid,
  pub tracking_plan_id:      Uuid,
  pub event_id:              Uuid,
  /// Whether properties outside the declared set are accepted for this event
  /// within this plan.
  pub additional_properties: bool,
  pub created_at:            DateTime<Utc>,
}

/// Links one property to one plan/event pairing. `required` is scoped to the
/// pairing, not to the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEventProperty {
  pub id:            Uuid,
  pub plan_event_id: Uuid,
  pub property_id:   Uuid,
  pub required:      bool,
  pub created_at:    DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::reconcile::CatalogTx::create_event`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub name:        String,
  pub event_type:  EventType,
  pub description: String,
}

/// Input to [`crate::reconcile::CatalogTx::create_property`].
#[derive(Debug, Clone)]
pub struct NewProperty {
  pub name:          String,
  pub property_type: PropertyType,
  pub description:   String,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A property as it appears under one event of one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPropertyView {
  pub property: Property,
  pub required: bool,
}

/// An event as it appears in one plan, with its declared properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEventView {
  pub plan_event_id:         Uuid,
  pub event:                 Event,
  pub additional_properties: bool,
  pub properties:            Vec<PlanPropertyView>,
}

/// Read model for a plan. Derived on every read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDetail {
  pub plan:   TrackingPlan,
  pub events: Vec<PlanEventView>,
}
