//! Location search: turns a radius or bounding-box request into exactly one
//! [`SpatialPredicate`] over building points.
//!
//! Points are SRID 4326 longitude/latitude pairs. Radius searches measure the
//! geodesic distance on the WGS84 ellipsoid; bounding boxes are closed
//! polygons whose boundary counts as inside.

use geo::{Coord, Distance, Geodesic, Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, organization::Page};

// ─── Coordinates ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  pub fn validate(&self) -> Result<()> {
    check_latitude("latitude", self.latitude)?;
    check_longitude("longitude", self.longitude)
  }

  /// The point with `x = longitude`, `y = latitude`.
  pub fn point(&self) -> Point<f64> { Point::new(self.longitude, self.latitude) }
}

fn check_latitude(field: &str, value: f64) -> Result<()> {
  if !(-90.0..=90.0).contains(&value) {
    return Err(Error::Validation(format!(
      "{field} must be between -90 and 90, got {value}"
    )));
  }
  Ok(())
}

fn check_longitude(field: &str, value: f64) -> Result<()> {
  if !(-180.0..=180.0).contains(&value) {
    return Err(Error::Validation(format!(
      "{field} must be between -180 and 180, got {value}"
    )));
  }
  Ok(())
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Body of `POST /organizations/search/by-location`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationSearch {
  /// Center latitude; only used in radius mode.
  pub latitude:      f64,
  /// Center longitude; only used in radius mode.
  pub longitude:     f64,
  pub radius_meters: Option<f64>,
  pub min_latitude:  Option<f64>,
  pub max_latitude:  Option<f64>,
  pub min_longitude: Option<f64>,
  pub max_longitude: Option<f64>,
  #[serde(flatten)]
  pub page:          Page,
}

impl LocationSearch {
  /// Range checks on every supplied field.
  ///
  /// [`translate`] does not repeat these; call this first.
  pub fn validate(&self) -> Result<()> {
    check_latitude("latitude", self.latitude)?;
    check_longitude("longitude", self.longitude)?;
    if let Some(r) = self.radius_meters
      && !(r > 0.0)
    {
      return Err(Error::Validation("radius_meters must be greater than 0".into()));
    }
    for (field, value) in [("min_latitude", self.min_latitude), ("max_latitude", self.max_latitude)] {
      if let Some(v) = value {
        check_latitude(field, v)?;
      }
    }
    for (field, value) in [("min_longitude", self.min_longitude), ("max_longitude", self.max_longitude)] {
      if let Some(v) = value {
        check_longitude(field, v)?;
      }
    }
    self.page.validate()
  }

  fn bounding_box(&self) -> Option<BoundingBox> {
    Some(BoundingBox {
      min_latitude:  self.min_latitude?,
      max_latitude:  self.max_latitude?,
      min_longitude: self.min_longitude?,
      max_longitude: self.max_longitude?,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub min_latitude:  f64,
  pub max_latitude:  f64,
  pub min_longitude: f64,
  pub max_longitude: f64,
}

impl BoundingBox {
  /// The rectangle traced corner to corner and closed back at the start.
  pub fn polygon(&self) -> Polygon<f64> {
    let ring = vec![
      (self.min_longitude, self.min_latitude),
      (self.max_longitude, self.min_latitude),
      (self.max_longitude, self.max_latitude),
      (self.min_longitude, self.max_latitude),
      (self.min_longitude, self.min_latitude),
    ];
    Polygon::new(LineString::from(ring), vec![])
  }
}

// ─── Predicate ───────────────────────────────────────────────────────────────

/// A filter on the building point column.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialPredicate {
  /// Spheroidal distance from `center` is at most `radius_meters`.
  WithinDistance { center: Point<f64>, radius_meters: f64 },
  /// The point lies in `polygon`, boundary included.
  WithinPolygon { polygon: Polygon<f64> },
}

impl SpatialPredicate {
  pub fn matches(&self, point: Point<f64>) -> bool {
    match self {
      Self::WithinDistance { center, radius_meters } => {
        spheroidal_distance(*center, point) <= *radius_meters
      }
      Self::WithinPolygon { polygon } => polygon_covers(polygon, point),
    }
  }

  pub fn mode(&self) -> &'static str {
    match self {
      Self::WithinDistance { .. } => "radius",
      Self::WithinPolygon { .. } => "bbox",
    }
  }
}

/// Pick the search mode. Radius wins over a bounding box; a partial bounding
/// box counts as absent.
pub fn translate(search: &LocationSearch) -> Result<SpatialPredicate> {
  if let Some(radius_meters) = search.radius_meters {
    let center = Coordinates { latitude: search.latitude, longitude: search.longitude }.point();
    return Ok(SpatialPredicate::WithinDistance { center, radius_meters });
  }
  if let Some(bbox) = search.bounding_box() {
    return Ok(SpatialPredicate::WithinPolygon { polygon: bbox.polygon() });
  }
  Err(Error::Validation(
    "either radius_meters or all four bounding box bounds must be provided".into(),
  ))
}

// ─── Geometry primitives ─────────────────────────────────────────────────────

/// Geodesic distance in meters on the WGS84 ellipsoid.
pub fn spheroidal_distance(a: Point<f64>, b: Point<f64>) -> f64 {
  Geodesic::distance(a, b)
}

pub fn polygon_covers(polygon: &Polygon<f64>, point: Point<f64>) -> bool {
  point.intersects(polygon)
}

/// Exterior ring as `[[lon, lat], ...]`.
pub fn polygon_ring(polygon: &Polygon<f64>) -> Vec<[f64; 2]> {
  polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
}

pub fn polygon_from_ring(ring: &[[f64; 2]]) -> Polygon<f64> {
  let coords: Vec<Coord<f64>> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
  Polygon::new(LineString::new(coords), vec![])
}
