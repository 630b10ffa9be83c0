//! Conflict resolution: the pure decision half of reconciliation.
//!
//! Every function here operates on rows the caller already fetched inside the
//! open transaction and performs no I/O. A rejection is returned as `Err`
//! carrying the [`Conflict`] to surface.

use uuid::Uuid;

use crate::{
  Conflict,
  catalog::{Event, EventType, PlanEvent, PlanEventProperty, Property},
  submission::{EventInput, PropertyInput},
};

/// Outcome of matching an incoming event against existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResolution {
  Reuse(Uuid),
  Create(EventType),
}

/// Outcome of matching an incoming property (or association) against an
/// existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  Reuse(Uuid),
  Create,
}

// ─── Descriptions ────────────────────────────────────────────────────────────

/// Whether two descriptions are equal once trimmed and with every internal
/// whitespace run collapsed to a single space.
pub fn descriptions_match(a: &str, b: &str) -> bool {
  a.split_whitespace().eq(b.split_whitespace())
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Decide whether `input` reuses one of `existing` (events of the same name
/// and owner), creates a new row, or is rejected.
///
/// Without a type, the name must resolve to at most one existing event; with
/// a type, only the exact `(name, type)` row is considered and other types of
/// the same name are left alone.
pub fn resolve_event(
  input: &EventInput,
  existing: &[Event],
) -> Result<EventResolution, Conflict> {
  let candidates: Vec<&Event> = existing
    .iter()
    .filter(|e| e.name == input.name)
    .filter(|e| input.event_type.is_none_or(|t| e.event_type == t))
    .collect();

  match (input.event_type, candidates.as_slice()) {
    (None, []) => Ok(EventResolution::Create(EventType::default())),
    (Some(t), []) => Ok(EventResolution::Create(t)),
    (None, [_, _, ..]) => {
      Err(Conflict::AmbiguousEventType { name: input.name.clone() })
    }
    // With a type, (name, type, owner) is unique: at most one candidate.
    (_, [event, ..]) => {
      if descriptions_match(&event.description, &input.description) {
        Ok(EventResolution::Reuse(event.id))
      } else {
        Err(Conflict::EventDescription { name: input.name.clone() })
      }
    }
  }
}

// ─── Properties ──────────────────────────────────────────────────────────────

/// Decide whether `input` reuses the property already stored under its
/// `(name, type)` or creates one.
///
/// Reuse is not final: the caller must still run [`check_required_conflict`]
/// against the property's existing links.
pub fn resolve_property_identity(
  input: &PropertyInput,
  existing: Option<&Property>,
) -> Result<Resolution, Conflict> {
  match existing {
    None => Ok(Resolution::Create),
    Some(p) if descriptions_match(&p.description, &input.description) => {
      Ok(Resolution::Reuse(p.id))
    }
    Some(_) => Err(Conflict::PropertyDescription {
      name:          input.name.clone(),
      property_type: input.property_type,
    }),
  }
}

/// Reject when any existing link of the property disagrees with
/// `incoming_required`. `associations` must cover every link of the property
/// across the whole catalog, not only the current submission.
pub fn check_required_conflict(
  property_name: &str,
  incoming_required: bool,
  associations: &[PlanEventProperty],
) -> Result<(), Conflict> {
  if associations.iter().any(|a| a.required != incoming_required) {
    return Err(Conflict::RequiredFlag { name: property_name.to_owned() });
  }
  Ok(())
}

// ─── Associations ────────────────────────────────────────────────────────────

/// Decide whether the plan/event link is reused or created.
///
/// A plan lists an event at most once; relisting it must agree on
/// `additionalProperties`.
pub fn check_plan_event(
  plan_name: &str,
  event_name: &str,
  existing: Option<&PlanEvent>,
  additional_properties: bool,
) -> Result<Resolution, Conflict> {
  match existing {
    None => Ok(Resolution::Create),
    Some(link) if link.additional_properties == additional_properties => {
      Ok(Resolution::Reuse(link.id))
    }
    Some(_) => Err(Conflict::AdditionalProperties {
      plan:  plan_name.to_owned(),
      event: event_name.to_owned(),
    }),
  }
}
