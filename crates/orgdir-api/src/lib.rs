//! JSON REST API for the organizations directory.
//!
//! Exposes an axum [`Router`] backed by any
//! [`orgdir_core::store::DirectoryStore`]. Every route requires the
//! `X-API-Key` header; TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", orgdir_api::api_router(state))
//! ```

pub mod activities;
pub mod auth;
pub mod buildings;
pub mod error;
pub mod extract;
pub mod organizations;
pub mod params;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use orgdir_core::store::DirectoryStore;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub api_key:            String,
  /// Upper bound for the `?level=` filter on `GET /activities/`.
  pub max_activity_depth: u8,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// Collection roots answer both with and without a trailing slash. The
/// returned `Router<()>` can be nested into any parent router regardless of
/// its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DirectoryStore + Clone + 'static,
{
  let activities_root = get(activities::list::<S>).post(activities::create::<S>);
  let buildings_root = get(buildings::list::<S>).post(buildings::create::<S>);
  let organizations_root = get(organizations::list::<S>).post(organizations::create::<S>);

  Router::new()
    // Activities
    .route("/activities", activities_root.clone())
    .route("/activities/", activities_root)
    .route("/activities/tree", get(activities::tree::<S>))
    .route("/activities/{id}", get(activities::get_one::<S>))
    // Buildings
    .route("/buildings", buildings_root.clone())
    .route("/buildings/", buildings_root)
    .route("/buildings/{id}", get(buildings::get_one::<S>))
    // Organizations
    .route("/organizations", organizations_root.clone())
    .route("/organizations/", organizations_root)
    .route("/organizations/{id}", get(organizations::get_one::<S>))
    .route("/organizations/by-building/{id}", get(organizations::by_building::<S>))
    .route("/organizations/by-activity/{id}", get(organizations::by_activity::<S>))
    .route("/organizations/search/by-name", get(organizations::by_name::<S>))
    .route("/organizations/search/by-location", post(organizations::by_location::<S>))
    .with_state(state)
}
