//! Core data models for route synthesis.

use serde::{Deserialize, Serialize};

use crate::style::RouteStyle;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and inside the valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Equality after rounding both points to 6 decimal places.
    pub fn same_position(&self, other: &GeoPoint) -> bool {
        round6(self.lat) == round6(other.lat) && round6(self.lon) == round6(other.lon)
    }
}

fn round6(value: f64) -> i64 {
    (value * 1e6).round() as i64
}

/// Ordered locations for a single routing request.
///
/// Always holds at least two points; a round trip ends where it starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointSet {
    points: Vec<GeoPoint>,
}

impl WaypointSet {
    /// `start → via… → start`.
    pub fn round_trip(start: GeoPoint, via: &[GeoPoint]) -> Self {
        let mut points = Vec::with_capacity(via.len() + 2);
        points.push(start);
        points.extend_from_slice(via);
        points.push(start);
        Self { points }
    }

    /// `start → via… → end`.
    pub fn point_to_point(start: GeoPoint, via: &[GeoPoint], end: GeoPoint) -> Self {
        let mut points = Vec::with_capacity(via.len() + 2);
        points.push(start);
        points.extend_from_slice(via);
        points.push(end);
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Intermediate locations, without the endpoints.
    pub fn via(&self) -> &[GeoPoint] {
        &self.points[1..self.points.len() - 1]
    }

    /// True when first and last coordinates are numerically equal.
    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }
}

/// Envelope returned by the routing oracle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripResponse {
    #[serde(default)]
    pub trip: Option<Trip>,
}

/// A multi-leg trip as produced by the routing oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub summary: TripSummary,
}

impl Trip {
    /// Total length in kilometers, if the oracle reported a usable number.
    pub fn length_km(&self) -> Option<f64> {
        self.summary.length.filter(|value| value.is_finite())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripSummary {
    /// Kilometers (requests ask for `units = kilometers`).
    #[serde(default)]
    pub length: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub time: Option<f64>,
}

/// One origin-to-next-location section of a trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub maneuvers: Vec<Maneuver>,
}

/// Turn instruction anchored to an index in its leg's shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Maneuver {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub begin_shape_index: Option<usize>,
}

/// A turn instruction resolved to a concrete position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnPoint {
    pub point: GeoPoint,
    pub instruction: String,
}

/// Flat path built from every leg of an accepted trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedPath {
    pub coordinates: Vec<GeoPoint>,
    pub maneuvers: Vec<TurnPoint>,
}

impl MergedPath {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Acceptable total-distance range in kilometers, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub min_km: f64,
    pub max_km: f64,
}

impl DistanceBand {
    pub fn new(min_km: f64, max_km: f64) -> Self {
        Self { min_km, max_km }
    }

    /// Band with no lower bound.
    pub fn at_most(max_km: f64) -> Self {
        Self { min_km: 0.0, max_km }
    }

    pub fn contains(&self, km: f64) -> bool {
        km >= self.min_km && km <= self.max_km
    }

    pub fn midpoint(&self) -> f64 {
        (self.min_km + self.max_km) / 2.0
    }

    /// Distance from `km` to the nearest edge of the band; zero inside it.
    pub fn miss_km(&self, km: f64) -> f64 {
        if km < self.min_km {
            self.min_km - km
        } else if km > self.max_km {
            km - self.max_km
        } else {
            0.0
        }
    }
}

/// Which correction mode produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripKind {
    RoundTrip,
    PointToPoint,
}

/// A trip the engine obtained from the oracle together with the inputs that
/// produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RouteCandidate {
    pub kind: TripKind,
    pub path: MergedPath,
    pub distance_km: f64,
    pub duration_s: Option<f64>,
    pub style: RouteStyle,
    /// Locations sent to the oracle, endpoints included.
    pub locations: WaypointSet,
    /// Radius used to synthesize round-trip waypoints.
    pub radius_km: Option<f64>,
    pub bearing_deg: Option<f64>,
    /// Oracle calls spent to reach this candidate.
    pub attempts: u32,
    pub overlap_score: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_set_is_closed() {
        let start = GeoPoint::new(45.0, 9.0);
        let set = WaypointSet::round_trip(start, &[GeoPoint::new(45.1, 9.1)]);
        assert!(set.is_closed());
        assert_eq!(set.len(), 3);
        assert_eq!(set.via(), &[GeoPoint::new(45.1, 9.1)]);
    }

    #[test]
    fn same_position_tolerates_sub_micro_degree_noise() {
        let a = GeoPoint::new(45.123456, 9.654321);
        let b = GeoPoint::new(45.1234561, 9.6543209);
        assert!(a.same_position(&b));
        assert!(!a.same_position(&GeoPoint::new(45.123458, 9.654321)));
    }

    #[test]
    fn band_miss_distance() {
        let band = DistanceBand::new(70.0, 80.0);
        assert!(band.contains(70.0) && band.contains(80.0));
        assert_eq!(band.miss_km(75.0), 0.0);
        assert_eq!(band.miss_km(95.0), 15.0);
        assert_eq!(band.miss_km(60.0), 10.0);
        assert_eq!(band.midpoint(), 75.0);
    }

    #[test]
    fn oracle_payload_deserializes_with_missing_fields() {
        let body = r#"{"trip":{"legs":[{"shape":"abc","maneuvers":[{"instruction":"Go","begin_shape_index":0},{}]}],"summary":{"length":12.5}}}"#;
        let response: TripResponse = serde_json::from_str(body).unwrap();
        let trip = response.trip.unwrap();
        assert_eq!(trip.length_km(), Some(12.5));
        assert_eq!(trip.summary.time, None);
        assert_eq!(trip.legs[0].maneuvers.len(), 2);
        assert_eq!(trip.legs[0].maneuvers[1].begin_shape_index, None);
    }
}
