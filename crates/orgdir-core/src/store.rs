//! The `DirectoryStore` trait.
//!
//! Implemented by storage backends (e.g. `orgdir-store-sqlite`). The HTTP
//! layer depends on this abstraction only.

use std::{collections::BTreeSet, future::Future};

use crate::{
  Classify,
  activity::{Activity, ActivityNode, NewActivity},
  building::{Building, NewBuilding},
  location::SpatialPredicate,
  organization::{BuildingList, NewOrganization, Organization, OrganizationList, Page},
};

/// Abstraction over a directory store backend.
///
/// Every write runs in a single store transaction: it either commits fully or
/// leaves the store as it was. Lookups of absent ids return `None`; filters
/// keyed on an absent id fail with a [`crate::ErrorKind::NotFound`] error.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Activities ────────────────────────────────────────────────────────

  /// Insert a node below `input.parent_id` (or as a root).
  ///
  /// Fails when the parent is absent, when the new level would exceed the
  /// store's configured maximum depth, or when the name is taken.
  fn create_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Flat listing ordered by `(level, name)`, optionally restricted to one
  /// level, paged after ordering.
  fn list_activities(
    &self,
    level: Option<u8>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  /// The whole forest, siblings ordered by name.
  fn activity_tree(
    &self,
  ) -> impl Future<Output = Result<Vec<ActivityNode>, Self::Error>> + Send + '_;

  /// The node `id` with all of its descendants nested below it.
  fn activity_subtree(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ActivityNode>, Self::Error>> + Send + '_;

  /// `id` plus every transitive descendant; `None` if `id` does not exist.
  fn descendant_activity_ids(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<BTreeSet<i64>>, Self::Error>> + Send + '_;

  // ── Buildings ─────────────────────────────────────────────────────────

  fn create_building(
    &self,
    input: NewBuilding,
  ) -> impl Future<Output = Result<Building, Self::Error>> + Send + '_;

  fn get_building(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Building>, Self::Error>> + Send + '_;

  fn list_buildings(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<BuildingList, Self::Error>> + Send + '_;

  // ── Organizations ─────────────────────────────────────────────────────

  /// Insert an organization with its phones and activity links.
  ///
  /// The building and every activity id must exist; otherwise nothing is
  /// written.
  fn create_organization(
    &self,
    input: NewOrganization,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn get_organization(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  fn list_organizations(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<OrganizationList, Self::Error>> + Send + '_;

  fn organizations_by_building(
    &self,
    building_id: i64,
    page: Page,
  ) -> impl Future<Output = Result<OrganizationList, Self::Error>> + Send + '_;

  /// Organizations linked to `activity_id` or any of its descendants.
  fn organizations_by_activity(
    &self,
    activity_id: i64,
    page: Page,
  ) -> impl Future<Output = Result<OrganizationList, Self::Error>> + Send + '_;

  /// Case-insensitive substring match on the organization name.
  fn search_organizations_by_name(
    &self,
    name: String,
    page: Page,
  ) -> impl Future<Output = Result<OrganizationList, Self::Error>> + Send + '_;

  /// Organizations whose building point satisfies `predicate`. `total`
  /// counts every match, not just the returned page.
  fn search_organizations_by_location(
    &self,
    predicate: SpatialPredicate,
    page: Page,
  ) -> impl Future<Output = Result<OrganizationList, Self::Error>> + Send + '_;
}
