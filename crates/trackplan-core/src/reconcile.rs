//! The tracking-plan reconciler.
//!
//! [`reconcile`] walks a [`PlanSubmission`] tree against one open transaction
//! and either returns the plan (the caller commits) or the first conflict
//! found (the caller rolls back). Nothing is written outside `tx`.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  OwnerId, ReconcileError,
  catalog::{
    Event, EventType, NewEvent, NewProperty, PlanEvent, PlanEventProperty,
    Property, PropertyType, TrackingPlan,
  },
  resolve::{self, EventResolution, Resolution},
  submission::{EventInput, PlanSubmission, PropertyInput},
};

// ─── Transaction trait ───────────────────────────────────────────────────────

/// One open catalog transaction.
///
/// Every method reads or writes through the same transaction, so later reads
/// observe earlier writes of the same reconciliation. Implementations report
/// unique-constraint failures through [`Self::Error`]; classifying them as
/// conflicts is the transaction wrapper's job.
pub trait CatalogTx {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_plan(
    &mut self,
    owner: &OwnerId,
    name: &str,
  ) -> Result<Option<TrackingPlan>, Self::Error>;

  /// Return the plan named `name`, creating it with `description` if absent.
  /// An existing plan's description is never overwritten.
  fn upsert_plan(
    &mut self,
    owner: &OwnerId,
    name: &str,
    description: Option<&str>,
  ) -> Result<TrackingPlan, Self::Error>;

  /// Events of `owner` named `name`, restricted to `event_type` if given.
  fn find_events(
    &mut self,
    owner: &OwnerId,
    name: &str,
    event_type: Option<EventType>,
  ) -> Result<Vec<Event>, Self::Error>;

  fn create_event(
    &mut self,
    owner: &OwnerId,
    input: NewEvent,
  ) -> Result<Event, Self::Error>;

  fn find_plan_event(
    &mut self,
    plan_id: Uuid,
    event_id: Uuid,
  ) -> Result<Option<PlanEvent>, Self::Error>;

  fn create_plan_event(
    &mut self,
    plan_id: Uuid,
    event_id: Uuid,
    additional_properties: bool,
  ) -> Result<PlanEvent, Self::Error>;

  fn find_property(
    &mut self,
    owner: &OwnerId,
    name: &str,
    property_type: PropertyType,
  ) -> Result<Option<Property>, Self::Error>;

  fn create_property(
    &mut self,
    owner: &OwnerId,
    input: NewProperty,
  ) -> Result<Property, Self::Error>;

  /// Every link of the property, across all plans.
  fn find_property_associations(
    &mut self,
    property_id: Uuid,
  ) -> Result<Vec<PlanEventProperty>, Self::Error>;

  fn find_plan_event_property(
    &mut self,
    plan_event_id: Uuid,
    property_id: Uuid,
  ) -> Result<Option<PlanEventProperty>, Self::Error>;

  fn create_plan_event_property(
    &mut self,
    plan_event_id: Uuid,
    property_id: Uuid,
    required: bool,
  ) -> Result<PlanEventProperty, Self::Error>;
}

// ─── Orchestration ───────────────────────────────────────────────────────────

/// Merge `submission` into `owner`'s catalog through `tx`.
///
/// Events and properties are processed in submission order and the first
/// conflict is returned immediately. The caller must roll `tx` back on any
/// `Err`: writes made before the conflict are not undone here.
pub fn reconcile<T: CatalogTx>(
  tx: &mut T,
  owner: &OwnerId,
  submission: &PlanSubmission,
) -> Result<TrackingPlan, ReconcileError<T::Error>> {
  let plan = tx
    .upsert_plan(owner, &submission.name, submission.description.as_deref())
    .map_err(ReconcileError::Store)?;

  for input in &submission.events {
    reconcile_event(tx, owner, &plan, input).inspect_err(|e| {
      if let Some(conflict) = e.conflict() {
        warn!(%owner, plan = %plan.name, event = %input.name, %conflict, "reconciliation rejected");
      }
    })?;
  }

  info!(
    %owner,
    plan_id = %plan.id,
    plan = %plan.name,
    events = submission.events.len(),
    properties = submission.property_count(),
    "tracking plan reconciled",
  );
  Ok(plan)
}

fn reconcile_event<T: CatalogTx>(
  tx: &mut T,
  owner: &OwnerId,
  plan: &TrackingPlan,
  input: &EventInput,
) -> Result<(), ReconcileError<T::Error>> {
  let existing = tx
    .find_events(owner, &input.name, input.event_type)
    .map_err(ReconcileError::Store)?;

  let event_id = match resolve::resolve_event(input, &existing)? {
    EventResolution::Reuse(id) => {
      debug!(event = %input.name, %id, "reusing event");
      id
    }
    EventResolution::Create(event_type) => {
      let event = tx
        .create_event(owner, NewEvent {
          name: input.name.clone(),
          event_type,
          description: input.description.clone(),
        })
        .map_err(ReconcileError::Store)?;
      debug!(event = %event.name, id = %event.id, %event_type, "created event");
      event.id
    }
  };

  let link = tx
    .find_plan_event(plan.id, event_id)
    .map_err(ReconcileError::Store)?;
  let plan_event_id = match resolve::check_plan_event(
    &plan.name,
    &input.name,
    link.as_ref(),
    input.additional_properties,
  )? {
    Resolution::Reuse(id) => id,
    Resolution::Create => {
      tx.create_plan_event(plan.id, event_id, input.additional_properties)
        .map_err(ReconcileError::Store)?
        .id
    }
  };

  for property in &input.properties {
    reconcile_property(tx, owner, plan_event_id, property)?;
  }
  Ok(())
}

fn reconcile_property<T: CatalogTx>(
  tx: &mut T,
  owner: &OwnerId,
  plan_event_id: Uuid,
  input: &PropertyInput,
) -> Result<(), ReconcileError<T::Error>> {
  let existing = tx
    .find_property(owner, &input.name, input.property_type)
    .map_err(ReconcileError::Store)?;

  let property_id = match resolve::resolve_property_identity(input, existing.as_ref())? {
    Resolution::Reuse(id) => {
      let links = tx
        .find_property_associations(id)
        .map_err(ReconcileError::Store)?;
      resolve::check_required_conflict(&input.name, input.required, &links)?;
      debug!(property = %input.name, %id, "reusing property");
      id
    }
    Resolution::Create => {
      let property = tx
        .create_property(owner, NewProperty {
          name:          input.name.clone(),
          property_type: input.property_type,
          description:   input.description.clone(),
        })
        .map_err(ReconcileError::Store)?;
      debug!(property = %property.name, id = %property.id, "created property");
      property.id
    }
  };

  // The required check above guarantees an existing link carries the same
  // flag, so it is reused as is.
  let existing_link = tx
    .find_plan_event_property(plan_event_id, property_id)
    .map_err(ReconcileError::Store)?;
  if existing_link.is_none() {
    tx.create_plan_event_property(plan_event_id, property_id, input.required)
      .map_err(ReconcileError::Store)?;
  }
  Ok(())
}
