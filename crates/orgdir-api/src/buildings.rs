//! Handlers for `/buildings` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use orgdir_core::{
  building::{Building, NewBuilding},
  organization::BuildingList,
  store::DirectoryStore,
};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
  params::PageParams,
};

/// `GET /buildings/`
pub async fn list<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<BuildingList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let list = state
    .store
    .list_buildings(params.page()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `GET /buildings/{id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Building>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let building = state
    .store
    .get_building(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| orgdir_core::Error::building_not_found(id))?;
  Ok(Json(building))
}

/// `POST /buildings/`, body: `{"address":"...","latitude":55.75,"longitude":37.61}`
pub async fn create<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<NewBuilding>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let building = state
    .store
    .create_building(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(building)))
}
