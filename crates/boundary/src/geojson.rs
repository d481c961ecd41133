//! GeoJSON boundary parsing.
//!
//! Polygonal geometries are collected from `Polygon`, `MultiPolygon`,
//! `GeometryCollection`, `Feature` and `FeatureCollection` objects. Every
//! polygonal member of a collection becomes one part of the boundary;
//! non-polygonal members (points, lines) are skipped.

use serde_json::Value;
use tracing::debug;

use crate::error::{BoundaryError, BoundaryResult};
use crate::polygon::{Point, Polygon};

/// Parse GeoJSON text into polygons.
pub fn parse_geojson(text: &str) -> BoundaryResult<Vec<Polygon>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| BoundaryError::InvalidGeoJson(e.to_string()))?;
    let mut polygons = Vec::new();
    collect(&value, &mut polygons)?;
    if polygons.is_empty() {
        return Err(BoundaryError::InvalidGeoJson(
            "no Polygon or MultiPolygon geometry found".to_string(),
        ));
    }
    Ok(polygons)
}

fn collect(value: &Value, out: &mut Vec<Polygon>) -> BoundaryResult<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| BoundaryError::InvalidGeoJson("object without \"type\"".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in array_member(value, "features")? {
                collect(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => debug!("Skipping feature without geometry"),
            Some(geometry) => collect(geometry, out)?,
        },
        "GeometryCollection" => {
            for geometry in array_member(value, "geometries")? {
                collect(geometry, out)?;
            }
        }
        "Polygon" => {
            let coords = value
                .get("coordinates")
                .ok_or_else(|| missing("coordinates"))?;
            out.push(polygon(coords)?);
        }
        "MultiPolygon" => {
            for coords in array_member(value, "coordinates")? {
                out.push(polygon(coords)?);
            }
        }
        other => debug!(geometry = other, "Skipping non-polygonal geometry"),
    }
    Ok(())
}

fn missing(member: &str) -> BoundaryError {
    BoundaryError::InvalidGeoJson(format!("missing \"{}\" array", member))
}

fn array_member<'a>(value: &'a Value, member: &str) -> BoundaryResult<&'a Vec<Value>> {
    value
        .get(member)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(member))
}

fn polygon(coords: &Value) -> BoundaryResult<Polygon> {
    let rings = coords
        .as_array()
        .ok_or_else(|| BoundaryError::InvalidGeoJson("polygon coordinates must be an array".into()))?
        .iter()
        .map(ring)
        .collect::<BoundaryResult<Vec<_>>>()?;
    Polygon::from_rings(rings)
}

fn ring(coords: &Value) -> BoundaryResult<Vec<Point>> {
    coords
        .as_array()
        .ok_or_else(|| BoundaryError::InvalidGeoJson("ring must be an array of positions".into()))?
        .iter()
        .map(position)
        .collect()
}

fn position(value: &Value) -> BoundaryResult<Point> {
    let pair = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| BoundaryError::InvalidCoordinate(value.to_string()))?;
    let x = pair[0]
        .as_f64()
        .ok_or_else(|| BoundaryError::InvalidCoordinate(pair[0].to_string()))?;
    let y = pair[1]
        .as_f64()
        .ok_or_else(|| BoundaryError::InvalidCoordinate(pair[1].to_string()))?;
    Ok((x, y))
}
