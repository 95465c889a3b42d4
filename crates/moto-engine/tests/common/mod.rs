//! Scripted oracles shared by the engine tests.

#![allow(dead_code)]

use moto_core::geo::destination;
use moto_core::polyline;
use moto_core::{
    ElevationOracle, GeoPoint, Leg, Maneuver, OracleError, RouteRequest, RoutingOracle, Trip,
    TripSummary,
};
use moto_engine::{EngineConfig, RouteEngine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const START: GeoPoint = GeoPoint::new(45.4642, 9.19);

#[derive(Debug, Clone)]
pub enum Reply {
    /// Trip through the requested locations with this total length.
    Km(f64),
    /// Trip along an explicit path with this total length.
    KmAlong(f64, Vec<GeoPoint>),
    Transport,
    Status(u16),
    NoTrip,
    /// Trip whose only leg carries a broken shape.
    Malformed(f64),
}

/// Answers requests from a script; the last reply repeats.
pub struct ScriptedRouter {
    replies: Vec<Reply>,
    requests: Mutex<Vec<RouteRequest>>,
}

impl ScriptedRouter {
    pub fn new(replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty());
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn kms(kms: &[f64]) -> Self {
        Self::new(kms.iter().map(|km| Reply::Km(*km)).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn trip_along(points: &[GeoPoint], km: f64) -> Trip {
    Trip {
        legs: vec![Leg {
            shape: polyline::encode(points),
            maneuvers: vec![Maneuver {
                instruction: "Depart".to_string(),
                begin_shape_index: Some(0),
            }],
        }],
        summary: TripSummary {
            length: Some(km),
            time: Some(km * 60.0),
        },
    }
}

impl RoutingOracle for ScriptedRouter {
    async fn route(&self, request: &RouteRequest) -> Result<Trip, OracleError> {
        let idx = {
            let mut seen = self.requests.lock().unwrap();
            seen.push(request.clone());
            seen.len() - 1
        };
        match self.replies[idx.min(self.replies.len() - 1)].clone() {
            Reply::Km(km) => Ok(trip_along(request.locations.points(), km)),
            Reply::KmAlong(km, path) => Ok(trip_along(&path, km)),
            Reply::Transport => Err(OracleError::Transport("connection refused".to_string())),
            Reply::Status(code) => Err(OracleError::Status(code)),
            Reply::NoTrip => Err(OracleError::MissingTrip),
            Reply::Malformed(km) => {
                let mut trip = trip_along(request.locations.points(), km);
                trip.legs[0].shape.push('_');
                Ok(trip)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Terrain {
    /// Every call fails.
    Down,
    /// Every call succeeds with no value at all, as outside a dataset's coverage.
    Uncovered,
    /// Elevation grows 1 m per 10 m travelled east of `START`.
    EastwardSlope,
    /// Like `EastwardSlope`, but every other point is unknown.
    Patchy,
}

/// Elevation stub. Earlier batches answer more slowly, so out-of-order
/// completion is exercised whenever batches run concurrently.
pub struct StubElevation {
    terrain: Terrain,
    calls: AtomicUsize,
}

impl StubElevation {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn eastward_m(point: GeoPoint) -> f64 {
    (point.lon - START.lon) * moto_core::geo::meters_per_deg_lon(START.lat)
}

impl ElevationOracle for StubElevation {
    async fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lead_m = points.first().map(|p| eastward_m(*p)).unwrap_or(0.0);
        let delay_ms = (40.0 - lead_m / 50.0).clamp(0.0, 40.0) as u64;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        let height = |p: &GeoPoint| 100.0 + eastward_m(*p) / 10.0;
        match self.terrain {
            Terrain::Down => Err(OracleError::Status(503)),
            Terrain::Uncovered => Ok(vec![None; points.len()]),
            Terrain::EastwardSlope => Ok(points.iter().map(|p| Some(height(p))).collect()),
            Terrain::Patchy => Ok(points
                .iter()
                .enumerate()
                .map(|(idx, p)| (idx % 2 == 0).then(|| height(p)))
                .collect()),
        }
    }
}

pub type TestEngine<'a> = RouteEngine<&'a ScriptedRouter, StubElevation>;

pub fn engine(router: &ScriptedRouter) -> TestEngine<'_> {
    RouteEngine::new(router, EngineConfig::default())
}

pub fn engine_with(router: &ScriptedRouter, config: EngineConfig) -> TestEngine<'_> {
    RouteEngine::new(router, config)
}

/// Straight walk east from `START`, one point every `step_m`.
pub fn east_path(length_m: f64, step_m: f64) -> Vec<GeoPoint> {
    let steps = (length_m / step_m).round() as usize;
    (0..=steps)
        .map(|i| destination(START, i as f64 * step_m / 1000.0, 90.0))
        .collect()
}

/// Walk a sequence of (bearing, km) legs from `START` in `step_km` steps.
pub fn walk(legs: &[(f64, f64)], step_km: f64) -> Vec<GeoPoint> {
    let mut points = vec![START];
    let mut current = START;
    for (bearing, length_km) in legs {
        let steps = (length_km / step_km).round() as usize;
        for _ in 0..steps {
            current = destination(current, step_km, *bearing);
            points.push(current);
        }
    }
    points
}
