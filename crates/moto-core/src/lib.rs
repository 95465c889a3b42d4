pub mod elevation;
pub mod error;
pub mod geo;
pub mod merge;
pub mod models;
pub mod oracle;
pub mod overlap;
pub mod polyline;
pub mod style;
pub mod synth;

pub use elevation::{climb_totals, interpolate_missing, resample, ElevationProfile};
pub use error::{OracleError, RouteError, ShapeError};
pub use geo::{destination, distance_km, initial_bearing};
pub use merge::{close_loop, merge_trip, translate_shape_index};
pub use models::{
    DistanceBand, GeoPoint, Leg, Maneuver, MergedPath, RouteCandidate, Trip, TripKind,
    TripResponse, TripSummary, TurnPoint, WaypointSet,
};
pub use oracle::{ElevationOracle, RouteRequest, RoutingOracle};
pub use overlap::{overlap_score, OverlapConfig};
pub use style::{CostProfile, RouteStyle, StyleLadder, UnknownStyle};
pub use synth::{
    distribute_slots, slot_bearings, synthesize_round_trip_waypoints, Compass, SlotFill,
    UnknownDirection,
};
