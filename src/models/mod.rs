//! Core record types for the listings snapshot.

pub mod listing;
pub mod neighborhood;

pub use listing::{ClusteredListing, Listing};
pub use neighborhood::{AggregateAttribute, Neighborhood, NeighborhoodRow};
