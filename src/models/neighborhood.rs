//! Neighborhood records and their aggregate attributes.

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// A raw neighborhood row as read from the polygons table.
///
/// The shape is still WKT text; it becomes a [`Neighborhood`] once the
/// geometry has been normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodRow {
    pub name: String,
    pub geo_shape: String,
    pub listing_count: Option<u64>,
    pub mean_price: Option<f64>,
    pub mean_quality: Option<f64>,
    pub mean_age: Option<f64>,
}

/// An administrative district with its parsed boundary.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    /// The neighborhood name, used verbatim as the choropleth join key
    pub id: String,
    /// Polygon or MultiPolygon in WGS84
    pub geometry: Geometry<f64>,
    pub listing_count: Option<u64>,
    pub mean_price: Option<f64>,
    pub mean_quality: Option<f64>,
    pub mean_age: Option<f64>,
}

impl Neighborhood {
    pub fn name(&self) -> &str {
        &self.id
    }

    /// Value of an aggregate attribute, `None` when the source cell was empty
    pub fn aggregate(&self, attribute: AggregateAttribute) -> Option<f64> {
        match attribute {
            AggregateAttribute::ListingCount => self.listing_count.map(|c| c as f64),
            AggregateAttribute::MeanPrice => self.mean_price,
            AggregateAttribute::MeanQuality => self.mean_quality,
            AggregateAttribute::MeanAge => self.mean_age,
        }
    }
}

/// Aggregate columns of the neighborhood table usable as choropleth color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateAttribute {
    ListingCount,
    MeanPrice,
    MeanQuality,
    MeanAge,
}

impl AggregateAttribute {
    /// Source column name in the neighborhood table
    pub fn column(&self) -> &'static str {
        match self {
            AggregateAttribute::ListingCount => "REAL_ESTATE_TOTAL",
            AggregateAttribute::MeanPrice => "PRICE_MEAN",
            AggregateAttribute::MeanQuality => "QUALITY_MEAN",
            AggregateAttribute::MeanAge => "AGE_MEAN",
        }
    }
}

impl std::fmt::Display for AggregateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateAttribute::ListingCount => write!(f, "listing_count"),
            AggregateAttribute::MeanPrice => write!(f, "mean_price"),
            AggregateAttribute::MeanQuality => write!(f, "mean_quality"),
            AggregateAttribute::MeanAge => write!(f, "mean_age"),
        }
    }
}
