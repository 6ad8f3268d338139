//! Process-wide, read-only dataset store.
//!
//! A [`Dataset`] is only ever produced by [`Dataset::load`] (or the path
//! based wrapper) and exposes nothing but shared references afterwards, so
//! it can be handed to every session behind an `Arc` without locking.

pub mod tables;

use geojson::FeatureCollection;
use hashbrown::HashSet;
use serde::Serialize;
use tracing::info;

use crate::config::DataConfig;
use crate::error::LoadError;
use crate::filter::NumericRange;
use crate::geometry::{normalize, WktParser};
use crate::models::{ClusteredListing, Listing, Neighborhood, NeighborhoodRow};

/// Observed attribute bounds, frozen at load time to seed filter defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetBounds {
    pub price: NumericRange,
    pub constructed_area: NumericRange,
    /// Distinct room counts, ascending
    pub room_numbers: Vec<u32>,
}

impl DatasetBounds {
    fn observe(listings: &[Listing]) -> Option<Self> {
        let first = listings.first()?;

        let mut price = NumericRange::new(first.price, first.price);
        let mut area = NumericRange::new(first.constructed_area, first.constructed_area);
        let mut rooms = Vec::new();

        for listing in listings {
            price.min = price.min.min(listing.price);
            price.max = price.max.max(listing.price);
            area.min = area.min.min(listing.constructed_area);
            area.max = area.max.max(listing.constructed_area);
            rooms.push(listing.room_number);
        }

        rooms.sort_unstable();
        rooms.dedup();

        Some(Self {
            price,
            constructed_area: area,
            room_numbers: rooms,
        })
    }
}

/// Listings, neighborhoods and their normalized geometry
#[derive(Debug)]
pub struct Dataset {
    listings: Vec<Listing>,
    neighborhoods: Vec<Neighborhood>,
    features: FeatureCollection,
    bounds: DatasetBounds,
    clustered: Option<Vec<ClusteredListing>>,
}

impl Dataset {
    /// Build the dataset from typed rows.
    ///
    /// Geometry is parsed once here. Fails on malformed or duplicate
    /// neighborhoods, on listings referencing an unknown neighborhood and
    /// on an empty listings table.
    pub fn load(
        listings: Vec<Listing>,
        neighborhood_rows: Vec<NeighborhoodRow>,
        clustered: Option<Vec<ClusteredListing>>,
    ) -> Result<Self, LoadError> {
        let normalized = normalize(
            &WktParser,
            neighborhood_rows
                .iter()
                .map(|row| (row.name.as_str(), row.geo_shape.as_str())),
        )?;
        let mut by_id = normalized.by_id;

        let mut neighborhoods = Vec::with_capacity(neighborhood_rows.len());
        let mut known = HashSet::with_capacity(neighborhood_rows.len());
        for row in neighborhood_rows {
            let Some(geometry) = by_id.remove(&row.name) else {
                // normalize() covers every row, so only a duplicate can miss
                return Err(LoadError::DuplicateNeighborhood(row.name));
            };
            known.insert(row.name.clone());
            neighborhoods.push(Neighborhood {
                id: row.name,
                geometry,
                listing_count: row.listing_count,
                mean_price: row.mean_price,
                mean_quality: row.mean_quality,
                mean_age: row.mean_age,
            });
        }

        for (i, listing) in listings.iter().enumerate() {
            if !known.contains(&listing.neighborhood_id) {
                return Err(LoadError::UnknownNeighborhood {
                    row: i + 1,
                    neighborhood: listing.neighborhood_id.clone(),
                });
            }
        }

        let bounds = DatasetBounds::observe(&listings).ok_or(LoadError::EmptyListings)?;

        info!(
            "Loaded {} listings across {} neighborhoods",
            listings.len(),
            neighborhoods.len()
        );
        info!(
            "Bounds: price [{}, {}], area [{}, {}], room counts {:?}",
            bounds.price.min,
            bounds.price.max,
            bounds.constructed_area.min,
            bounds.constructed_area.max,
            bounds.room_numbers
        );
        if let Some(ref rows) = clustered {
            info!("Loaded {} pre-clustered listings", rows.len());
        }

        Ok(Self {
            listings,
            neighborhoods,
            features: normalized.features,
            bounds,
            clustered,
        })
    }

    /// Read the configured tables from disk and build the dataset
    pub fn load_from_paths(data: &DataConfig) -> Result<Self, LoadError> {
        let listings =
            tables::read_listings(tables::open_table(&data.listings, tables::LISTINGS)?)?;
        let neighborhoods = tables::read_neighborhoods(tables::open_table(
            &data.neighborhoods,
            tables::NEIGHBORHOODS,
        )?)?;
        let clustered = match &data.clustered {
            Some(path) => Some(tables::read_clustered(tables::open_table(
                path,
                tables::CLUSTERED,
            )?)?),
            None => None,
        };

        Self::load(listings, neighborhoods, clustered)
    }

    /// Listings in source order
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Neighborhoods in source order
    pub fn neighborhoods(&self) -> &[Neighborhood] {
        &self.neighborhoods
    }

    /// GeoJSON collection with one feature per neighborhood, `id` = name
    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    pub fn bounds(&self) -> &DatasetBounds {
        &self.bounds
    }

    pub fn clustered(&self) -> Option<&[ClusteredListing]> {
        self.clustered.as_deref()
    }
}
