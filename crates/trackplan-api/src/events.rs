//! Handlers for `/events` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/events` | Optional `?name=` |
//! | `GET`   | `/events/:id` | 404 if not found |
//! | `PATCH` | `/events/:id` | Body: `{"description":"..."}` |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
};
use trackplan_core::{catalog::Event, store::CatalogStore};
use uuid::Uuid;

use crate::{AppState, DescriptionUpdate, NameFilter, auth::Owner, error::ApiError};

/// `GET /events[?name=<name>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  query: Result<Query<NameFilter>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: CatalogStore + 'static,
{
  let Query(filter) = query?;
  let found = state
    .store
    .list_events(owner, filter.name)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(found))
}

/// `GET /events/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Event>, ApiError>
where
  S: CatalogStore + 'static,
{
  let Path(id) = path?;
  let found = state
    .store
    .get_event(owner, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(found))
}

/// `PATCH /events/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  path: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<DescriptionUpdate>, JsonRejection>,
) -> Result<Json<Event>, ApiError>
where
  S: CatalogStore + 'static,
{
  let Path(id) = path?;
  let Json(update) = body?;
  if update.description.trim().is_empty() {
    return Err(ApiError::BadRequest("description must not be blank".to_owned()));
  }

  let updated = state
    .store
    .update_event_description(owner, id, update.description)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(updated))
}
