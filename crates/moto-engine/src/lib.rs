//! Route synthesis engine: the caller-facing entry points over the
//! correction runs and the elevation profile builder.
//!
//! The engine holds only configuration and oracle handles. All per-run
//! state lives inside a call, so one engine can serve concurrent callers.

pub mod config;
pub mod correction;
pub mod profile;

pub use config::{EngineConfig, ElevationConfig, PointToPointConfig, RoundTripConfig};
pub use correction::{
    better_candidate, correct_point_to_point, correct_round_trip, deviation_score, seed_radius,
    CorrectionState,
};

use moto_core::error::Result;
use moto_core::geo::{distance_km, path_length_km};
use moto_core::{
    Compass, ElevationOracle, ElevationProfile, GeoPoint, MergedPath, RouteCandidate,
    RouteError, RoutingOracle, StyleLadder, WaypointSet,
};
use moto_oracle::{ElevationClient, ValhallaClient};
use tracing::Instrument;
use uuid::Uuid;

pub struct RouteEngine<R, E> {
    router: R,
    elevation: Option<E>,
    elevation_fallback: Option<E>,
    config: EngineConfig,
}

impl RouteEngine<ValhallaClient, ElevationClient> {
    /// Engine wired to the HTTP oracles named in `config`.
    pub fn from_config(config: EngineConfig) -> std::result::Result<Self, moto_core::OracleError> {
        let router = ValhallaClient::new(&config.valhalla)?;
        let user_agent = config.user_agent().to_string();
        let elevation_client =
            |url: &str| ElevationClient::new(url, config.elevation.timeout, &user_agent);

        let elevation = Some(config.elevation.url.trim())
            .filter(|url| !url.is_empty())
            .map(elevation_client)
            .transpose()?;
        let elevation_fallback = config
            .elevation
            .fallback_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(elevation_client)
            .transpose()?;

        Ok(Self {
            router,
            elevation,
            elevation_fallback,
            config,
        })
    }
}

impl<R: RoutingOracle, E: ElevationOracle> RouteEngine<R, E> {
    pub fn new(router: R, config: EngineConfig) -> Self {
        Self {
            router,
            elevation: None,
            elevation_fallback: None,
            config,
        }
    }

    pub fn with_elevation(mut self, primary: E, fallback: Option<E>) -> Self {
        self.elevation = Some(primary);
        self.elevation_fallback = fallback;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loop from `start` back to itself, within the round-trip band.
    ///
    /// With a direction, one correction run explores that bearing. Without
    /// one, every configured exploration bearing gets its own run and the
    /// in-band candidates are ranked by overlap, then by distance to the
    /// band midpoint.
    pub async fn synthesize_round_trip(
        &self,
        start: GeoPoint,
        direction: Option<Compass>,
        waypoints: &[GeoPoint],
        ladder: StyleLadder,
    ) -> Result<RouteCandidate> {
        let config = &self.config.round_trip;
        validate_round_trip(start, waypoints, config)?;

        let bearings: Vec<f64> = match direction {
            Some(direction) => vec![direction.bearing()],
            None if config.explore_bearings_deg.is_empty() => vec![Compass::DEFAULT.bearing()],
            None => config.explore_bearings_deg.clone(),
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "round_trip",
            %run_id,
            direction = ?direction,
            style = %ladder.current()
        );

        async move {
            let mut best: Option<RouteCandidate> = None;
            let mut failures: Vec<RouteError> = Vec::new();

            for bearing in bearings {
                match correct_round_trip(
                    &self.router,
                    start,
                    bearing,
                    waypoints,
                    ladder.clone(),
                    config,
                )
                .await
                {
                    Ok(candidate) => {
                        tracing::info!(
                            bearing,
                            distance_km = candidate.distance_km,
                            overlap = candidate.overlap_score,
                            "in-band loop found"
                        );
                        best = Some(match best {
                            Some(current) => {
                                if std::ptr::eq(
                                    better_candidate(&current, &candidate, &config.band),
                                    &candidate,
                                ) {
                                    candidate
                                } else {
                                    current
                                }
                            }
                            None => candidate,
                        });
                    }
                    Err(err @ RouteError::MalformedShape(_)) => return Err(err),
                    Err(err) => failures.push(err),
                }
            }

            match best {
                Some(candidate) => Ok(candidate),
                None => Err(combine_failures(failures, &config.band)),
            }
        }
        .instrument(span)
        .await
    }

    /// Route from `start` to `end` through `waypoints`, no longer than the
    /// point-to-point maximum.
    pub async fn synthesize_point_to_point(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        waypoints: &[GeoPoint],
        ladder: StyleLadder,
    ) -> Result<RouteCandidate> {
        let config = &self.config.point_to_point;
        validate_point_to_point(start, end, waypoints, config)?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "point_to_point",
            %run_id,
            waypoints = waypoints.len(),
            style = %ladder.current()
        );
        correct_point_to_point(&self.router, start, end, waypoints, ladder, config)
            .instrument(span)
            .await
    }

    /// Elevation profile for an accepted path; `None` without an elevation
    /// source or when no sample could be fetched.
    pub async fn build_elevation_profile(&self, path: &MergedPath) -> Option<ElevationProfile> {
        let primary = self.elevation.as_ref()?;
        profile::build_profile(
            primary,
            self.elevation_fallback.as_ref(),
            &path.coordinates,
            &self.config.elevation,
        )
        .await
    }
}

fn validate_point(label: &str, point: GeoPoint) -> Result<()> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(RouteError::InputRejected(format!(
            "{label} ({}, {}) is not a valid coordinate",
            point.lat, point.lon
        )))
    }
}

fn validate_round_trip(
    start: GeoPoint,
    waypoints: &[GeoPoint],
    config: &RoundTripConfig,
) -> Result<()> {
    validate_point("start", start)?;
    if !(config.band.min_km.is_finite()
        && config.band.max_km.is_finite()
        && config.band.min_km <= config.band.max_km)
    {
        return Err(RouteError::InputRejected(format!(
            "invalid distance band {}-{} km",
            config.band.min_km, config.band.max_km
        )));
    }
    if waypoints.len() > config.max_user_waypoints {
        return Err(RouteError::InputRejected(format!(
            "at most {} waypoints allowed for a round trip, got {}",
            config.max_user_waypoints,
            waypoints.len()
        )));
    }
    for waypoint in waypoints {
        validate_point("waypoint", *waypoint)?;
        let km = distance_km(start, *waypoint);
        if km > config.max_radius_km {
            return Err(RouteError::InputRejected(format!(
                "waypoint is {km:.1} km from the start, limit is {} km",
                config.max_radius_km
            )));
        }
    }
    Ok(())
}

fn validate_point_to_point(
    start: GeoPoint,
    end: GeoPoint,
    waypoints: &[GeoPoint],
    config: &PointToPointConfig,
) -> Result<()> {
    validate_point("start", start)?;
    validate_point("end", end)?;
    if waypoints.len() > config.max_user_waypoints {
        return Err(RouteError::InputRejected(format!(
            "at most {} waypoints allowed, got {}",
            config.max_user_waypoints,
            waypoints.len()
        )));
    }
    for waypoint in waypoints {
        validate_point("waypoint", *waypoint)?;
    }

    let direct_km = distance_km(start, end);
    if direct_km > config.max_radius_km {
        return Err(RouteError::InputRejected(format!(
            "destination is {direct_km:.1} km away in a straight line, limit is {} km",
            config.max_radius_km
        )));
    }
    let through_km = path_length_km(
        WaypointSet::point_to_point(start, waypoints, end).points(),
        false,
    );
    if through_km > config.max_km {
        return Err(RouteError::InputRejected(format!(
            "waypoints alone span {through_km:.1} km, limit is {} km",
            config.max_km
        )));
    }
    Ok(())
}

/// Fold per-bearing failures into one outcome. Any run that got responses
/// makes the whole search `CannotMeetConstraints`, carrying the overall
/// closest miss.
fn combine_failures(failures: Vec<RouteError>, band: &moto_core::DistanceBand) -> RouteError {
    let mut attempts = 0u32;
    let mut responded = false;
    let mut closest: Option<Box<RouteCandidate>> = None;

    for failure in failures {
        match failure {
            RouteError::OracleUnavailable { attempts: used } => attempts += used,
            RouteError::CannotMeetConstraints {
                attempts: used,
                closest: miss,
            } => {
                attempts += used;
                responded = true;
                if let Some(miss) = miss {
                    let nearer = closest.as_ref().map_or(true, |best| {
                        band.miss_km(miss.distance_km) < band.miss_km(best.distance_km)
                    });
                    if nearer {
                        closest = Some(miss);
                    }
                }
            }
            other => return other,
        }
    }

    if responded {
        RouteError::CannotMeetConstraints { attempts, closest }
    } else {
        RouteError::OracleUnavailable { attempts }
    }
}
