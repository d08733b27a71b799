//! Spatial and text SQL functions registered on every connection, and the
//! rendering of a [`SpatialPredicate`] into a `WHERE` fragment that uses them.
//!
//! | Function | Result |
//! |----------|--------|
//! | `st_distance_spheroid(lon1, lat1, lon2, lat2)` | geodesic meters on WGS84 |
//! | `st_covers_ring(ring_json, lon, lat)` | 1 if the point is in or on the ring |
//! | `casefold(text)` | Unicode lowercase |

use geo::{BoundingRect, Point, Polygon};
use orgdir_core::location::{
  SpatialPredicate, polygon_covers, polygon_from_ring, polygon_ring, spheroidal_distance,
};
use rusqlite::{Connection, functions::FunctionFlags, types::Value};

use crate::Result;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn flags() -> FunctionFlags {
  FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC
}

pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function("st_distance_spheroid", 4, flags(), |ctx| {
    let a = Point::new(ctx.get::<f64>(0)?, ctx.get::<f64>(1)?);
    let b = Point::new(ctx.get::<f64>(2)?, ctx.get::<f64>(3)?);
    Ok(spheroidal_distance(a, b))
  })?;

  // The ring is a bound parameter, constant for the statement: parse it once
  // and keep the polygon as auxiliary data on the argument.
  conn.create_scalar_function("st_covers_ring", 3, flags(), |ctx| {
    let polygon = ctx.get_or_create_aux(0, |raw| -> Result<Polygon<f64>, BoxError> {
      let ring: Vec<[f64; 2]> = serde_json::from_str(raw.as_str()?)?;
      Ok(polygon_from_ring(&ring))
    })?;
    let point = Point::new(ctx.get::<f64>(1)?, ctx.get::<f64>(2)?);
    Ok(polygon_covers(&polygon, point))
  })?;

  conn.create_scalar_function("casefold", 1, flags(), |ctx| {
    let text: Option<String> = ctx.get(0)?;
    Ok(text.map(|t| t.to_lowercase()))
  })?;

  Ok(())
}

/// Render `predicate` as a boolean SQL expression over the given point
/// columns, with its bound parameters in placeholder order.
pub fn predicate_sql(
  predicate: &SpatialPredicate,
  lon_col: &str,
  lat_col: &str,
) -> Result<(String, Vec<Value>)> {
  match predicate {
    SpatialPredicate::WithinDistance { center, radius_meters } => Ok((
      format!("st_distance_spheroid({lon_col}, {lat_col}, ?, ?) <= ?"),
      vec![
        Value::Real(center.x()),
        Value::Real(center.y()),
        Value::Real(*radius_meters),
      ],
    )),
    SpatialPredicate::WithinPolygon { polygon } => {
      let ring = serde_json::to_string(&polygon_ring(polygon))?;
      let covers = format!("st_covers_ring(?, {lon_col}, {lat_col})");
      // Range prefilter on the indexed columns.
      let Some(rect) = polygon.bounding_rect() else {
        return Ok((covers, vec![Value::Text(ring)]));
      };
      Ok((
        format!("{lon_col} BETWEEN ? AND ? AND {lat_col} BETWEEN ? AND ? AND {covers}"),
        vec![
          Value::Real(rect.min().x),
          Value::Real(rect.max().x),
          Value::Real(rect.min().y),
          Value::Real(rect.max().y),
          Value::Text(ring),
        ],
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use orgdir_core::location::BoundingBox;

  use super::*;

  fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    register_functions(&conn).unwrap();
    conn
  }

  #[test]
  fn distance_function_matches_core() {
    let d: f64 = conn()
      .query_row(
        "SELECT st_distance_spheroid(37.6173, 55.7558, 37.5951, 55.7520)",
        [],
        |r| r.get(0),
      )
      .unwrap();
    let expected = spheroidal_distance(Point::new(37.6173, 55.7558), Point::new(37.5951, 55.7520));
    assert!((d - expected).abs() < 1e-6);
  }

  #[test]
  fn covers_function_includes_boundary() {
    let conn = conn();
    let ring = r#"[[0,0],[1,0],[1,1],[0,1],[0,0]]"#;
    let on_edge: bool = conn
      .query_row("SELECT st_covers_ring(?1, 1.0, 0.5)", [ring], |r| r.get(0))
      .unwrap();
    let outside: bool = conn
      .query_row("SELECT st_covers_ring(?1, 1.5, 0.5)", [ring], |r| r.get(0))
      .unwrap();
    assert!(on_edge);
    assert!(!outside);
  }

  #[test]
  fn covers_function_evaluates_many_rows_with_one_ring() {
    let conn = conn();
    conn
      .execute_batch(
        "CREATE TABLE pts (lon REAL, lat REAL);
         INSERT INTO pts VALUES (0.5, 0.5), (1.0, 1.0), (2.0, 0.5), (0.0, 0.2), (-1.0, -1.0);",
      )
      .unwrap();
    let ring = r#"[[0,0],[1,0],[1,1],[0,1],[0,0]]"#;
    let inside: i64 = conn
      .query_row("SELECT COUNT(*) FROM pts WHERE st_covers_ring(?1, lon, lat)", [ring], |r| {
        r.get(0)
      })
      .unwrap();
    assert_eq!(inside, 3);
  }

  #[test]
  fn covers_function_rejects_bad_ring() {
    let result: rusqlite::Result<bool> =
      conn().query_row("SELECT st_covers_ring('nope', 0.0, 0.0)", [], |r| r.get(0));
    assert!(result.is_err());
  }

  #[test]
  fn casefold_handles_non_ascii() {
    let folded: String = conn()
      .query_row("SELECT casefold('МОЛОКО Milk')", [], |r| r.get(0))
      .unwrap();
    assert_eq!(folded, "молоко milk");
  }

  #[test]
  fn polygon_sql_has_prefilter_then_ring() {
    let polygon = BoundingBox {
      min_latitude:  55.0,
      max_latitude:  56.0,
      min_longitude: 37.0,
      max_longitude: 38.0,
    }
    .polygon();
    let (sql, params) =
      predicate_sql(&SpatialPredicate::WithinPolygon { polygon }, "b.longitude", "b.latitude")
        .unwrap();
    assert!(sql.starts_with("b.longitude BETWEEN ? AND ?"));
    assert!(sql.ends_with("st_covers_ring(?, b.longitude, b.latitude)"));
    assert_eq!(params.len(), 5);
    assert_eq!(params[0], Value::Real(37.0));
    assert!(matches!(params[4], Value::Text(_)));
  }

  #[test]
  fn radius_sql_binds_center_and_radius() {
    let predicate = SpatialPredicate::WithinDistance {
      center:        Point::new(2.3522, 48.8566),
      radius_meters: 500.0,
    };
    let (sql, params) = predicate_sql(&predicate, "lon", "lat").unwrap();
    assert_eq!(sql, "st_distance_spheroid(lon, lat, ?, ?) <= ?");
    assert_eq!(params, vec![Value::Real(2.3522), Value::Real(48.8566), Value::Real(500.0)]);
  }
}
