//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `trackplan-store-sqlite`). Higher layers (`trackplan-api`) depend on this
//! abstraction, not on any concrete backend. Every call is scoped to an
//! owner: rows of other owners behave as if they did not exist.

use std::future::Future;

use uuid::Uuid;

use crate::{
  OwnerId, ReconcileError,
  catalog::{Event, PlanDetail, Property, TrackingPlan},
  submission::PlanSubmission,
};

/// Abstraction over a tracking-plan catalog backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Merge `submission` into the owner's catalog in one transaction.
  ///
  /// Either every write commits and the plan is returned, or nothing does
  /// and the first [`Conflict`](crate::Conflict) (or store failure) is
  /// returned. Unique-constraint failures raised by the backend surface as
  /// [`Conflict::Concurrent`](crate::Conflict::Concurrent).
  fn reconcile(
    &self,
    owner: OwnerId,
    submission: PlanSubmission,
  ) -> impl Future<Output = Result<TrackingPlan, ReconcileError<Self::Error>>> + Send + '_;

  // ── Plans ─────────────────────────────────────────────────────────────

  fn list_plans(
    &self,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Vec<TrackingPlan>, Self::Error>> + Send + '_;

  fn get_plan(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TrackingPlan>, Self::Error>> + Send + '_;

  /// Materialise a [`PlanDetail`]. Returns `None` if the plan does not exist.
  fn plan_detail(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PlanDetail>, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// List events, optionally restricted to one name.
  fn list_events(
    &self,
    owner: OwnerId,
    name: Option<String>,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Replace an event's description. Returns `None` if not found.
  fn update_event_description(
    &self,
    owner: OwnerId,
    id: Uuid,
    description: String,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  // ── Properties ────────────────────────────────────────────────────────

  fn list_properties(
    &self,
    owner: OwnerId,
    name: Option<String>,
  ) -> impl Future<Output = Result<Vec<Property>, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    owner: OwnerId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  fn update_property_description(
    &self,
    owner: OwnerId,
    id: Uuid,
    description: String,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;
}
