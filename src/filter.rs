//! Filter state: numeric ranges plus the room selector.
//!
//! Control events always carry a complete [`FilterState`]. Before it is
//! applied, [`FilterState::sanitize`] corrects inverted ranges and unknown
//! room counts instead of rejecting the request.

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetBounds;
use crate::models::Listing;

/// Slider steps used by the dashboard controls
pub const AREA_STEP: f64 = 15.0;
pub const PRICE_STEP: f64 = 1000.0;

/// Wire value of the "all rooms" option
pub const ALL_ROOMS: i64 = -1;

/// Inclusive numeric range, serialized as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both ends inclusive
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// True if this range lies inside `outer`
    pub fn is_within(&self, outer: &NumericRange) -> bool {
        outer.min <= self.min && self.max <= outer.max
    }

    /// Correct a user-supplied range against the observed bounds.
    ///
    /// A non-finite end (NaN or infinite) means unbounded on that side and
    /// takes the observed bound. Inverted ends are swapped. A range that
    /// overlaps `observed` is intersected with it; a range disjoint from
    /// `observed` is kept as is, since clamping it onto a bound would select
    /// the listings sitting on that bound. The result is always finite with
    /// `min <= max`.
    pub fn sanitize(self, observed: &NumericRange) -> Self {
        let min = if self.min.is_finite() { self.min } else { observed.min };
        let max = if self.max.is_finite() { self.max } else { observed.max };
        let range = if min > max { Self::new(max, min) } else { Self::new(min, max) };

        if range.is_disjoint_from(observed) {
            return range;
        }
        Self::new(range.min.max(observed.min), range.max.min(observed.max))
    }

    /// True if no observed value can fall inside this range
    pub fn is_disjoint_from(&self, observed: &NumericRange) -> bool {
        self.max < observed.min || self.min > observed.max
    }
}

impl From<[f64; 2]> for NumericRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<NumericRange> for [f64; 2] {
    fn from(range: NumericRange) -> Self {
        [range.min, range.max]
    }
}

/// Room count selector; serialized as `-1` for all rooms or the count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RoomSelector {
    All,
    Exactly(u32),
}

impl RoomSelector {
    pub fn matches(&self, room_number: u32) -> bool {
        match self {
            RoomSelector::All => true,
            RoomSelector::Exactly(n) => *n == room_number,
        }
    }

    /// True if every room count accepted by `self` is accepted by `other`
    pub fn is_at_least_as_restrictive_as(&self, other: &RoomSelector) -> bool {
        match other {
            RoomSelector::All => true,
            RoomSelector::Exactly(_) => self == other,
        }
    }
}

impl From<i64> for RoomSelector {
    fn from(value: i64) -> Self {
        u32::try_from(value)
            .map(RoomSelector::Exactly)
            .unwrap_or(RoomSelector::All)
    }
}

impl From<RoomSelector> for i64 {
    fn from(selector: RoomSelector) -> Self {
        match selector {
            RoomSelector::All => ALL_ROOMS,
            RoomSelector::Exactly(n) => i64::from(n),
        }
    }
}

/// The complete predicate selected on the controls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub area_range: NumericRange,
    pub price_range: NumericRange,
    pub room_selector: RoomSelector,
}

impl FilterState {
    /// Default state: the full observed bounds and all room counts
    pub fn full(bounds: &DatasetBounds) -> Self {
        Self {
            area_range: bounds.constructed_area,
            price_range: bounds.price,
            room_selector: RoomSelector::All,
        }
    }

    /// Inclusion predicate for one listing
    pub fn matches(&self, listing: &Listing) -> bool {
        self.area_range.contains(listing.constructed_area)
            && self.price_range.contains(listing.price)
            && self.room_selector.matches(listing.room_number)
    }

    /// Bring the state back within the dataset bounds.
    ///
    /// Every listing lies within the observed bounds, so clamping alone
    /// never changes which listings match; only swapped ends, NaN ends and
    /// unknown room counts do.
    pub fn sanitize(self, bounds: &DatasetBounds) -> Self {
        let room_selector = match self.room_selector {
            RoomSelector::Exactly(n) if !bounds.room_numbers.contains(&n) => RoomSelector::All,
            selector => selector,
        };

        Self {
            area_range: self.area_range.sanitize(&bounds.constructed_area),
            price_range: self.price_range.sanitize(&bounds.price),
            room_selector,
        }
    }

    /// True if `self` selects a subset of what `other` selects by bounds alone
    pub fn is_tightening_of(&self, other: &FilterState) -> bool {
        self.area_range.is_within(&other.area_range)
            && self.price_range.is_within(&other.price_range)
            && self
                .room_selector
                .is_at_least_as_restrictive_as(&other.room_selector)
    }
}

/// One range slider of the control surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// What the controls need to render: slider bounds, room options and the
/// default state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSurface {
    pub area: SliderSpec,
    pub price: SliderSpec,
    /// `-1` first, then each observed room count ascending
    pub room_options: Vec<i64>,
    pub defaults: FilterState,
}

impl ControlSurface {
    pub fn from_bounds(bounds: &DatasetBounds) -> Self {
        let room_options = std::iter::once(ALL_ROOMS)
            .chain(bounds.room_numbers.iter().map(|&n| i64::from(n)))
            .collect();

        Self {
            area: SliderSpec {
                min: bounds.constructed_area.min,
                max: bounds.constructed_area.max,
                step: AREA_STEP,
            },
            price: SliderSpec {
                min: bounds.price.min,
                max: bounds.price.max,
                step: PRICE_STEP,
            },
            room_options,
            defaults: FilterState::full(bounds),
        }
    }
}
