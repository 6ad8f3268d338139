//! Geometry normalization for neighborhood boundaries.
//!
//! Parses the WKT shapes of the neighborhood table exactly once and builds
//! the ID-addressable GeoJSON FeatureCollection consumed by choropleth
//! rendering.

mod features;
mod parser;

pub use features::{normalize, NormalizedGeometry};
pub use parser::{geometry_kind, round_trip_deviation, to_wkt, GeometryParser, WktParser};
