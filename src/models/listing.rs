//! Listing records.

use serde::{Deserialize, Serialize};

/// One real-estate unit for sale.
///
/// Listings are created once by the loader and never mutated; filtering
/// produces views of borrowed listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// WGS84 latitude
    pub latitude: f64,
    /// WGS84 longitude
    pub longitude: f64,
    /// Asking price in currency units (positive)
    pub price: f64,
    /// Constructed area in m² (positive)
    pub constructed_area: f64,
    pub room_number: u32,
    /// Free-form build type label; empty when the table has no BUILDTYPE column
    pub build_type: String,
    /// Join key into the neighborhood table
    pub neighborhood_id: String,
    pub is_new_construction: bool,
}

/// A listing position carrying a pre-computed cluster label.
///
/// The label is opaque: it is displayed, never recomputed or filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredListing {
    pub latitude: f64,
    pub longitude: f64,
    pub cluster: String,
}
