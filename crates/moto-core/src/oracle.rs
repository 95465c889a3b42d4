//! Seams to the external routing and elevation services.
//!
//! The engine only talks to these traits, so correction runs can be driven
//! by the HTTP clients in `moto-oracle` or by in-memory stubs.

use std::future::Future;

use serde::Serialize;

use crate::error::OracleError;
use crate::models::{GeoPoint, Trip, WaypointSet};
use crate::style::{CostProfile, RouteStyle};

/// One routing request: ordered locations plus a cost profile.
#[derive(Debug, Clone, Serialize)]
pub struct RouteRequest {
    pub locations: WaypointSet,
    pub style: RouteStyle,
    pub profile: CostProfile,
}

impl RouteRequest {
    pub fn new(locations: WaypointSet, style: RouteStyle) -> Self {
        Self {
            locations,
            style,
            profile: style.cost_profile(),
        }
    }
}

/// Service that turns ordered locations into a multi-leg trip.
pub trait RoutingOracle: Send + Sync {
    fn route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Trip, OracleError>> + Send;
}

/// Service that returns one elevation (or `None`) per requested point, in
/// request order.
pub trait ElevationOracle: Send + Sync {
    fn elevations(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, OracleError>> + Send;
}

impl<T: RoutingOracle> RoutingOracle for &T {
    fn route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Trip, OracleError>> + Send {
        (**self).route(request)
    }
}

impl<T: ElevationOracle> ElevationOracle for &T {
    fn elevations(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, OracleError>> + Send {
        (**self).elevations(points)
    }
}
