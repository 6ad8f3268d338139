//! Polygon parsing behind a narrow capability.

use std::str::FromStr;

use geo::CoordsIter;
use geo_types::Geometry;
use wkt::{ToWkt, Wkt};

use crate::error::GeometryError;

/// Turns a textual shape into Polygon or MultiPolygon geometry.
///
/// Implementations perform no reprojection: coordinates come back in the
/// reference system they were written in.
pub trait GeometryParser {
    fn parse_polygon(&self, text: &str) -> Result<Geometry<f64>, GeometryError>;
}

/// Well-known-text parser backed by the `wkt` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct WktParser;

impl GeometryParser for WktParser {
    fn parse_polygon(&self, text: &str) -> Result<Geometry<f64>, GeometryError> {
        let parsed = Wkt::<f64>::from_str(text.trim())
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;
        let geometry = Geometry::<f64>::try_from(parsed)
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;

        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(geometry),
            other => Err(GeometryError::Unsupported(geometry_kind(&other))),
        }
    }
}

/// Serialize geometry back to WKT text
pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

/// Name of the geometry variant, as used in WKT
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Largest coordinate drift after serializing to WKT and parsing again.
///
/// Returns infinity when the re-parsed shape has a different number of
/// coordinates or a different geometry type.
pub fn round_trip_deviation(
    parser: &impl GeometryParser,
    geometry: &Geometry<f64>,
) -> Result<f64, GeometryError> {
    let reparsed = parser.parse_polygon(&to_wkt(geometry))?;

    if geometry_kind(&reparsed) != geometry_kind(geometry)
        || reparsed.coords_count() != geometry.coords_count()
    {
        return Ok(f64::INFINITY);
    }

    let deviation = geometry
        .coords_iter()
        .zip(reparsed.coords_iter())
        .map(|(a, b)| (a.x - b.x).abs().max((a.y - b.y).abs()))
        .fold(0.0_f64, f64::max);

    Ok(deviation)
}
