//! Handlers for `/activities` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/activities/` | Optional `?level=`, `?limit=`, `?offset=` |
//! | `GET`  | `/activities/tree` | Whole forest |
//! | `GET`  | `/activities/{id}` | Node with its subtree; 404 if absent |
//! | `POST` | `/activities/` | Body: `{"name":"Meat","parent_id":1}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use orgdir_core::{
  activity::{Activity, ActivityNode, NewActivity},
  store::DirectoryStore,
};
use serde::Serialize;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
  params::ActivityListParams,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /activities/[?level=<n>]`
pub async fn list<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<ActivityListParams>,
) -> Result<Json<Vec<Activity>>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let page = params.page()?;
  let max = state.config.max_activity_depth;
  if let Some(level) = params.level
    && !(1..=max).contains(&level)
  {
    return Err(ApiError::Validation(format!("level must be between 1 and {max}")));
  }

  let activities = state
    .store
    .list_activities(params.level, page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(activities))
}

// ─── Tree ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ActivityTree {
  pub activities: Vec<ActivityNode>,
}

/// `GET /activities/tree`
pub async fn tree<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<ActivityTree>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let activities = state.store.activity_tree().await.map_err(ApiError::from_store)?;
  Ok(Json(ActivityTree { activities }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /activities/{id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<ActivityNode>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let node = state
    .store
    .activity_subtree(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| orgdir_core::Error::activity_not_found(id))?;
  Ok(Json(node))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /activities/`
pub async fn create<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<NewActivity>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let activity = state
    .store
    .create_activity(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(ActivityNode::leaf(activity))))
}
