//! Headline figures for the dashboard header.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::models::{AggregateAttribute, Neighborhood};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_listings: usize,
    /// Neighborhood with the highest listing count
    pub busiest_neighborhood: Option<String>,
    /// Neighborhood with the highest mean price
    pub priciest_neighborhood: Option<String>,
    pub new_construction_listings: usize,
    pub snapshot_year: u16,
}

impl Summary {
    pub fn compute(dataset: &Dataset, snapshot_year: u16) -> Self {
        Self {
            total_listings: dataset.listings().len(),
            busiest_neighborhood: top_by(dataset.neighborhoods(), AggregateAttribute::ListingCount),
            priciest_neighborhood: top_by(dataset.neighborhoods(), AggregateAttribute::MeanPrice),
            new_construction_listings: dataset
                .listings()
                .iter()
                .filter(|l| l.is_new_construction)
                .count(),
            snapshot_year,
        }
    }
}

/// First neighborhood holding the maximum of `attribute`; empty cells skipped
fn top_by(neighborhoods: &[Neighborhood], attribute: AggregateAttribute) -> Option<String> {
    let mut best: Option<(&Neighborhood, f64)> = None;
    for neighborhood in neighborhoods {
        let Some(value) = neighborhood.aggregate(attribute) else {
            continue;
        };
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((neighborhood, value)),
        }
    }
    best.map(|(n, _)| n.name().to_string())
}
