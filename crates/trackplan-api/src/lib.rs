//! JSON REST API for the tracking-plan catalog.
//!
//! Exposes an axum [`Router`] backed by any
//! [`trackplan_core::store::CatalogStore`]. Every route is authenticated by
//! API key and scoped to the key's owner. TLS and listening are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", trackplan_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod events;
pub mod plans;
pub mod properties;

use std::sync::Arc;

use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use trackplan_core::store::CatalogStore;

pub use auth::{ApiKeys, Owner, digest_key};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub keys:  Arc<ApiKeys>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      keys:  Arc::clone(&self.keys),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: S, keys: ApiKeys) -> Self {
    Self {
      store: Arc::new(store),
      keys:  Arc::new(keys),
    }
  }
}

// ─── Shared request shapes ────────────────────────────────────────────────────

/// `?name=` filter accepted by the catalog list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct NameFilter {
  pub name: Option<String>,
}

/// Body of the description `PATCH` endpoints.
#[derive(Debug, Deserialize)]
pub struct DescriptionUpdate {
  pub description: String,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    // Tracking plans
    .route("/tracking-plans", get(plans::list::<S>).post(plans::create::<S>))
    .route("/tracking-plans/{id}", get(plans::get_one::<S>))
    // Events
    .route("/events", get(events::list::<S>))
    .route("/events/{id}", get(events::get_one::<S>).patch(events::update::<S>))
    // Properties
    .route("/properties", get(properties::list::<S>))
    .route(
      "/properties/{id}",
      get(properties::get_one::<S>).patch(properties::update::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
