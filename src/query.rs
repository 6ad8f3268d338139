//! Query engine: the filtered view of the listings table.

use tracing::debug;

use crate::dataset::Dataset;
use crate::filter::FilterState;
use crate::models::Listing;

/// Listings of `dataset` matching `filter`, in source order.
///
/// Pure: the same inputs always produce the same rows in the same order,
/// and an empty result is a valid view.
pub fn apply<'a>(dataset: &'a Dataset, filter: &FilterState) -> Vec<&'a Listing> {
    let subset = filter_listings(dataset.listings(), filter);
    debug!(
        "Filter {:?} selected {} of {} listings",
        filter,
        subset.len(),
        dataset.listings().len()
    );
    subset
}

/// Apply the filter predicate to any sequence of listings, preserving order
pub fn filter_listings<'a, I>(listings: I, filter: &FilterState) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .filter(|listing| filter.matches(listing))
        .collect()
}
