//! Handlers for `/tracking-plans` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tracking-plans` | The caller's plans |
//! | `POST` | `/tracking-plans` | Reconcile a submission; 409 on conflict |
//! | `GET`  | `/tracking-plans/:id` | Plan with events and properties |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use trackplan_core::{
  catalog::{PlanDetail, TrackingPlan},
  store::CatalogStore,
  submission::PlanSubmission,
};
use uuid::Uuid;

use crate::{AppState, auth::Owner, error::ApiError};

/// `GET /tracking-plans`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<TrackingPlan>>, ApiError>
where
  S: CatalogStore + 'static,
{
  let plans = state.store.list_plans(owner).await.map_err(ApiError::store)?;
  Ok(Json(plans))
}

/// `POST /tracking-plans`
///
/// The submission is validated before anything touches the store. On success
/// the plan row (new or reused) is returned with `201 Created`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  body: Result<Json<PlanSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
{
  let Json(submission) = body?;
  submission.validate()?;

  let plan = state.store.reconcile(owner, submission).await?;
  Ok((StatusCode::CREATED, Json(plan)))
}

/// `GET /tracking-plans/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PlanDetail>, ApiError>
where
  S: CatalogStore + 'static,
{
  let Path(id) = path?;
  let detail = state
    .store
    .plan_detail(owner, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tracking plan {id} not found")))?;
  Ok(Json(detail))
}
