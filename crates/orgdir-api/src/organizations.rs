//! Handlers for `/organizations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/organizations/` | Paged listing |
//! | `GET`  | `/organizations/{id}` | 404 if absent |
//! | `GET`  | `/organizations/by-building/{id}` | 404 if the building is absent |
//! | `GET`  | `/organizations/by-activity/{id}` | Includes descendant activities |
//! | `GET`  | `/organizations/search/by-name` | `?name=` substring, any case |
//! | `POST` | `/organizations/search/by-location` | Radius or bounding box |
//! | `POST` | `/organizations/` | Create with phones and activity links |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use orgdir_core::{
  location::{self, LocationSearch},
  organization::{NewOrganization, Organization, OrganizationList},
  store::DirectoryStore,
};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
  params::{NameSearchParams, PageParams},
};

/// `GET /organizations/`
pub async fn list<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<OrganizationList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let list = state
    .store
    .list_organizations(params.page()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `GET /organizations/{id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Organization>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let organization = state
    .store
    .get_organization(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| orgdir_core::Error::organization_not_found(id))?;
  Ok(Json(organization))
}

/// `GET /organizations/by-building/{id}`
pub async fn by_building<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiPath(building_id): ApiPath<i64>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<OrganizationList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let list = state
    .store
    .organizations_by_building(building_id, params.page()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `GET /organizations/by-activity/{id}`
pub async fn by_activity<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiPath(activity_id): ApiPath<i64>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<OrganizationList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let list = state
    .store
    .organizations_by_activity(activity_id, params.page()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `GET /organizations/search/by-name?name=<substring>`
pub async fn by_name<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<NameSearchParams>,
) -> Result<Json<OrganizationList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let page = params.page()?;
  if params.name.is_empty() {
    return Err(ApiError::Validation("name must not be empty".into()));
  }
  let list = state
    .store
    .search_organizations_by_name(params.name, page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `POST /organizations/search/by-location`
pub async fn by_location<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiJson(search): ApiJson<LocationSearch>,
) -> Result<Json<OrganizationList>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  search.validate()?;
  let predicate = location::translate(&search)?;
  let list = state
    .store
    .search_organizations_by_location(predicate, search.page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(list))
}

/// `POST /organizations/`
pub async fn create<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<NewOrganization>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let organization = state
    .store
    .create_organization(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(organization)))
}
