//! Request and response bodies of the dashboard API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use barrios::filter::{FilterState, NumericRange, RoomSelector};
use barrios::models::AggregateAttribute;
use barrios::projection::{MapSpec, PointEncoding};

/// Stateless point-map query; missing bounds default to the dataset bounds
#[derive(Debug, Deserialize)]
pub struct PointsQueryParams {
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    /// Room count, or -1 for all
    pub rooms: Option<i64>,
    /// Color channel (defaults to price)
    pub color: Option<PointEncoding>,
}

impl PointsQueryParams {
    /// Complete filter state, with unset fields taken from `defaults`
    pub fn to_filter(&self, defaults: &FilterState) -> FilterState {
        FilterState {
            area_range: NumericRange::new(
                self.area_min.unwrap_or(defaults.area_range.min),
                self.area_max.unwrap_or(defaults.area_range.max),
            ),
            price_range: NumericRange::new(
                self.price_min.unwrap_or(defaults.price_range.min),
                self.price_max.unwrap_or(defaults.price_range.max),
            ),
            room_selector: self
                .rooms
                .map(RoomSelector::from)
                .unwrap_or(defaults.room_selector),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChoroplethQueryParams {
    pub attribute: AggregateAttribute,
}

#[derive(Serialize)]
pub struct PointsResponse {
    /// The filter actually applied, after sanitizing
    pub filter: FilterState,
    pub map: MapSpec<'static>,
}

#[derive(Serialize)]
pub struct SessionCreated {
    pub id: Uuid,
    pub filter: FilterState,
}

/// One control event: the complete filter state plus its client sequence
#[derive(Debug, Deserialize)]
pub struct FilterEvent {
    pub seq: u64,
    pub filter: FilterState,
    #[serde(default)]
    pub color: PointEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Applied,
    Superseded,
}

#[derive(Serialize)]
pub struct FilterEventResponse {
    pub status: EventStatus,
    pub seq: u64,
    /// Applied filter on success, otherwise the last committed one
    pub filter: FilterState,
    /// Newest sequence seen for the session
    pub latest: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapSpec<'static>>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub listings: usize,
    pub neighborhoods: usize,
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrios::DatasetBounds;

    fn defaults() -> FilterState {
        FilterState {
            area_range: NumericRange::new(60.0, 150.0),
            price_range: NumericRange::new(100_000.0, 400_000.0),
            room_selector: RoomSelector::All,
        }
    }

    #[test]
    fn test_missing_params_use_defaults() {
        let params = PointsQueryParams {
            area_min: None,
            area_max: Some(100.0),
            price_min: None,
            price_max: None,
            rooms: Some(3),
            color: None,
        };

        let filter = params.to_filter(&defaults());
        assert_eq!(filter.area_range, NumericRange::new(60.0, 100.0));
        assert_eq!(filter.price_range, defaults().price_range);
        assert_eq!(filter.room_selector, RoomSelector::Exactly(3));
    }

    #[test]
    fn test_filter_event_body() {
        let event: FilterEvent = serde_json::from_str(
            r#"{"seq": 7, "filter": {"area_range": [60, 90], "price_range": [0, 250000], "room_selector": 2}}"#,
        )
        .unwrap();

        assert_eq!(event.seq, 7);
        assert_eq!(event.color, PointEncoding::Price);
        assert_eq!(event.filter.room_selector, RoomSelector::Exactly(2));
    }

    #[test]
    fn test_infinite_params_sanitize_to_finite_filter() {
        let bounds = DatasetBounds {
            price: defaults().price_range,
            constructed_area: defaults().area_range,
            room_numbers: vec![1, 2, 3],
        };
        let params = PointsQueryParams {
            area_min: Some(f64::NEG_INFINITY),
            area_max: None,
            price_min: Some(f64::INFINITY),
            price_max: Some(f64::INFINITY),
            rooms: None,
            color: None,
        };

        let filter = params.to_filter(&defaults()).sanitize(&bounds);
        assert_eq!(filter.price_range, bounds.price);
        assert_eq!(filter.area_range, bounds.constructed_area);

        let json = serde_json::to_value(filter).unwrap();
        assert_eq!(json["price_range"][0], 100_000.0);
        assert_eq!(json["price_range"][1], 400_000.0);
        assert!(!json.to_string().contains("null"));
    }

    #[test]
    fn test_superseded_response_omits_map() {
        let response = FilterEventResponse {
            status: EventStatus::Superseded,
            seq: 3,
            filter: defaults(),
            latest: Some(5),
            map: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "superseded");
        assert_eq!(json["latest"], 5);
        assert!(json.get("map").is_none());
    }
}
