//! View projection: filtered listings or neighborhood aggregates to a map
//! specification for the rendering side.
//!
//! Projections borrow their inputs and build a fresh [`MapSpec`] on every
//! call. Color values are passed through as-is; binning and legends belong
//! to the renderer.

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::models::{AggregateAttribute, ClusteredListing, Listing};

/// Map center
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Visual frame of a map; constant across interactions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapLayout {
    pub center: MapCenter,
    pub zoom: f64,
}

impl MapLayout {
    pub fn new(lat: f64, lon: f64, zoom: f64) -> Self {
        Self {
            center: MapCenter { lat, lon },
            zoom,
        }
    }
}

/// Color channel of the per-listing point layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointEncoding {
    #[default]
    Price,
    ConstructedArea,
    BuildType,
}

impl PointEncoding {
    fn channel(&self) -> &'static str {
        match self {
            PointEncoding::Price => "price",
            PointEncoding::ConstructedArea => "constructed_area",
            PointEncoding::BuildType => "build_type",
        }
    }

    fn value(&self, listing: &Listing) -> ColorValue {
        match self {
            PointEncoding::Price => ColorValue::Number(listing.price),
            PointEncoding::ConstructedArea => ColorValue::Number(listing.constructed_area),
            PointEncoding::BuildType => ColorValue::Category(listing.build_type.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorValue {
    Number(f64),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub value: ColorValue,
}

/// Choropleth region; `id` matches a feature id of the collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region<'a> {
    pub id: &'a str,
    pub value: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapLayer<'a> {
    Points {
        color: &'static str,
        points: Vec<MapPoint>,
    },
    Choropleth {
        color: AggregateAttribute,
        geojson: &'a FeatureCollection,
        regions: Vec<Region<'a>>,
    },
}

/// A renderable map: one layer plus its frame
#[derive(Debug, Serialize)]
pub struct MapSpec<'a> {
    #[serde(flatten)]
    pub layer: MapLayer<'a>,
    pub layout: MapLayout,
}

impl MapSpec<'_> {
    /// Number of points or regions carried by the layer
    pub fn len(&self) -> usize {
        match &self.layer {
            MapLayer::Points { points, .. } => points.len(),
            MapLayer::Choropleth { regions, .. } => regions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One point per listing, in the order given
pub fn project_points<'a, I>(
    listings: I,
    encoding: PointEncoding,
    layout: MapLayout,
) -> MapSpec<'static>
where
    I: IntoIterator<Item = &'a Listing>,
{
    let points = listings
        .into_iter()
        .map(|listing| MapPoint {
            lat: listing.latitude,
            lon: listing.longitude,
            value: encoding.value(listing),
        })
        .collect();

    MapSpec {
        layer: MapLayer::Points {
            color: encoding.channel(),
            points,
        },
        layout,
    }
}

/// Neighborhood polygons colored by an aggregate attribute.
///
/// Regions join the feature collection on neighborhood id; the dataset
/// guarantees both sides cover the same ids.
pub fn project_choropleth(
    dataset: &Dataset,
    attribute: AggregateAttribute,
    layout: MapLayout,
) -> MapSpec<'_> {
    let regions = dataset
        .neighborhoods()
        .iter()
        .map(|n| Region {
            id: n.id.as_str(),
            value: n.aggregate(attribute),
        })
        .collect();

    MapSpec {
        layer: MapLayer::Choropleth {
            color: attribute,
            geojson: dataset.features(),
            regions,
        },
        layout,
    }
}

/// Pre-clustered listings colored by their opaque cluster label
pub fn project_clusters(clustered: &[ClusteredListing], layout: MapLayout) -> MapSpec<'static> {
    let points = clustered
        .iter()
        .map(|row| MapPoint {
            lat: row.latitude,
            lon: row.longitude,
            value: ColorValue::Category(row.cluster.clone()),
        })
        .collect();

    MapSpec {
        layer: MapLayer::Points {
            color: "cluster",
            points,
        },
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::four_listings;
    use crate::filter::{FilterState, NumericRange, RoomSelector};
    use crate::query::apply;

    fn layout() -> MapLayout {
        MapLayout::new(39.46, -0.37, 11.5)
    }

    #[test]
    fn test_points_follow_subset_order() {
        let dataset = four_listings();
        let spec = project_points(dataset.listings(), PointEncoding::Price, layout());

        match &spec.layer {
            MapLayer::Points { color, points } => {
                assert_eq!(*color, "price");
                let values: Vec<&ColorValue> = points.iter().map(|p| &p.value).collect();
                assert_eq!(
                    values,
                    vec![
                        &ColorValue::Number(100_000.0),
                        &ColorValue::Number(200_000.0),
                        &ColorValue::Number(300_000.0),
                        &ColorValue::Number(400_000.0),
                    ]
                );
            }
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_subset_projects_to_empty_map() {
        let dataset = four_listings();
        let filter = FilterState {
            price_range: NumericRange::new(1.0, 2.0),
            area_range: NumericRange::new(0.0, 1000.0),
            room_selector: RoomSelector::All,
        };

        let subset = apply(&dataset, &filter);
        let spec = project_points(subset, PointEncoding::Price, layout());
        assert!(spec.is_empty());
        assert_eq!(spec.layout, layout());

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mode"], "points");
        assert_eq!(json["points"], serde_json::json!([]));
        assert_eq!(json["layout"]["zoom"], 11.5);
    }

    #[test]
    fn test_categorical_point_encoding() {
        let dataset = four_listings();
        let spec = project_points(dataset.listings(), PointEncoding::BuildType, layout());
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["color"], "build_type");
        assert_eq!(json["points"][0]["value"], "secondhand");
        assert_eq!(json["points"][0]["lat"], 39.47);
    }

    #[test]
    fn test_choropleth_joins_on_neighborhood_id() {
        let dataset = four_listings();
        let spec = project_choropleth(&dataset, AggregateAttribute::MeanQuality, layout());

        match &spec.layer {
            MapLayer::Choropleth {
                color,
                geojson,
                regions,
            } => {
                assert_eq!(*color, AggregateAttribute::MeanQuality);
                assert_eq!(regions.len(), geojson.features.len());
                for (region, feature) in regions.iter().zip(&geojson.features) {
                    assert_eq!(
                        feature.id,
                        Some(geojson::feature::Id::String(region.id.to_string()))
                    );
                    assert_eq!(region.value, Some(3.5));
                }
            }
            other => panic!("expected choropleth, got {:?}", other),
        }

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mode"], "choropleth");
        assert_eq!(json["color"], "mean_quality");
        assert_eq!(json["geojson"]["type"], "FeatureCollection");
    }

    #[test]
    fn test_projection_leaves_dataset_untouched() {
        let dataset = four_listings();
        let before: Vec<Listing> = dataset.listings().to_vec();

        let _ = project_points(dataset.listings(), PointEncoding::ConstructedArea, layout());
        let _ = project_choropleth(&dataset, AggregateAttribute::MeanAge, layout());

        assert_eq!(dataset.listings(), before.as_slice());
    }

    #[test]
    fn test_cluster_layer() {
        let rows = vec![
            ClusteredListing {
                latitude: 39.47,
                longitude: -0.37,
                cluster: "0".to_string(),
            },
            ClusteredListing {
                latitude: 39.46,
                longitude: -0.36,
                cluster: "4".to_string(),
            },
        ];
        let spec = project_clusters(&rows, MapLayout::new(39.46, -0.37, 12.0));
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(spec.len(), 2);
        assert_eq!(json["color"], "cluster");
        assert_eq!(json["points"][1]["value"], "4");
    }
}
