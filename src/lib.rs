//! Barrios - neighborhood listings explorer.
//!
//! This library provides the load pipeline (CSV tables and WKT neighborhood
//! shapes), the filter/query engine and the map projection shared by the
//! `serve` and `normalize` binaries.

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod models;
pub mod projection;
pub mod query;
pub mod session;
pub mod summary;

pub use dataset::{Dataset, DatasetBounds};
pub use error::{GeometryError, LoadError};
pub use filter::{FilterState, NumericRange, RoomSelector};
pub use models::{ClusteredListing, Listing, Neighborhood, NeighborhoodRow};
