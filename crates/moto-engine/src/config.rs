//! Engine configuration from environment.

use moto_core::{DistanceBand, OverlapConfig};
use moto_oracle::{ValhallaConfig, OPENTOPODATA_EUDEM25M_URL, OPEN_ELEVATION_URL};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "MotoRoute/1.1";

#[derive(Debug, Clone)]
pub struct RoundTripConfig {
    pub band: DistanceBand,
    /// Oracle calls allowed per explored bearing.
    pub max_attempts: u32,
    /// Radius multiplier applied after each failed attempt.
    pub decay: f64,
    pub min_radius_km: f64,
    /// User waypoints farther than this from the start are rejected.
    pub max_radius_km: f64,
    /// Radii tried when seeding, largest first.
    pub seed_radii_km: Vec<f64>,
    /// Road length over straight-line length, used to estimate a loop
    /// before asking the oracle.
    pub detour_factor: f64,
    /// Slots filled around the start (user and synthesized together).
    pub target_waypoints: usize,
    pub max_user_waypoints: usize,
    /// Base bearings explored when the rider gives no direction.
    pub explore_bearings_deg: Vec<f64>,
    pub overlap: OverlapConfig,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            band: DistanceBand::new(70.0, 80.0),
            max_attempts: 3,
            decay: 0.85,
            min_radius_km: 8.0,
            max_radius_km: 80.0,
            seed_radii_km: vec![35.0, 30.0, 25.0, 20.0, 15.0, 10.0],
            detour_factor: 1.3,
            target_waypoints: 3,
            max_user_waypoints: 2,
            explore_bearings_deg: vec![45.0],
            overlap: OverlapConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointToPointConfig {
    pub max_km: f64,
    /// Largest straight-line start to end distance accepted.
    pub max_radius_km: f64,
    pub max_user_waypoints: usize,
    pub overlap: OverlapConfig,
}

impl Default for PointToPointConfig {
    fn default() -> Self {
        Self {
            max_km: 120.0,
            max_radius_km: 80.0,
            max_user_waypoints: 4,
            overlap: OverlapConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElevationConfig {
    pub url: String,
    /// Queried for a batch only when `url` failed for it.
    pub fallback_url: Option<String>,
    pub spacing_m: f64,
    pub batch_size: usize,
    /// Batches in flight at once.
    pub concurrency: usize,
    pub timeout: Duration,
    /// Elevation steps at or below this size are ignored in gain/loss.
    pub noise_m: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            url: OPENTOPODATA_EUDEM25M_URL.to_string(),
            fallback_url: Some(OPEN_ELEVATION_URL.to_string()),
            spacing_m: 50.0,
            batch_size: 100,
            concurrency: 2,
            timeout: Duration::from_secs(10),
            noise_m: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub valhalla: ValhallaConfig,
    pub round_trip: RoundTripConfig,
    pub point_to_point: PointToPointConfig,
    pub elevation: ElevationConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let user_agent =
            env::var("MOTO_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let valhalla = ValhallaConfig {
            url: env::var("VALHALLA_URL").unwrap_or(defaults.valhalla.url),
            fallback_url: env_opt("VALHALLA_URL_FALLBACK"),
            timeout: Duration::from_secs(env_parse(
                "MOTO_ORACLE_TIMEOUT_S",
                defaults.valhalla.timeout.as_secs(),
            )),
            retries: env_parse("MOTO_ORACLE_RETRIES", defaults.valhalla.retries),
            retry_base: defaults.valhalla.retry_base,
            user_agent: user_agent.clone(),
        };

        let rt = defaults.round_trip;
        let round_trip = RoundTripConfig {
            band: DistanceBand::new(
                env_parse("MOTO_RT_MIN_KM", rt.band.min_km),
                env_parse("MOTO_RT_MAX_KM", rt.band.max_km),
            ),
            max_attempts: env_parse("MOTO_RT_MAX_ATTEMPTS", rt.max_attempts),
            decay: env_parse("MOTO_RT_DECAY", rt.decay),
            min_radius_km: env_parse("MOTO_RT_MIN_RADIUS_KM", rt.min_radius_km),
            max_radius_km: env_parse("MOTO_P2P_MAX_RADIUS_KM", rt.max_radius_km),
            explore_bearings_deg: env_list("MOTO_RT_EXPLORE_BEARINGS")
                .unwrap_or(rt.explore_bearings_deg),
            ..rt
        };

        let p2p = defaults.point_to_point;
        let point_to_point = PointToPointConfig {
            max_km: env_parse("MOTO_P2P_MAX_KM", p2p.max_km),
            max_radius_km: env_parse("MOTO_P2P_MAX_RADIUS_KM", p2p.max_radius_km),
            ..p2p
        };

        let elev = defaults.elevation;
        let elevation = ElevationConfig {
            url: env::var("MOTO_ELEVATION_URL").unwrap_or(elev.url),
            fallback_url: match env::var("MOTO_ELEVATION_FALLBACK_URL") {
                Ok(value) => Some(value).filter(|value| !value.trim().is_empty()),
                Err(_) => elev.fallback_url,
            },
            spacing_m: env_parse("MOTO_ELEVATION_SPACING_M", elev.spacing_m),
            batch_size: env_parse("MOTO_ELEVATION_BATCH", elev.batch_size),
            concurrency: env_parse("MOTO_ELEVATION_CONCURRENCY", elev.concurrency),
            timeout: Duration::from_secs(env_parse(
                "MOTO_ELEVATION_TIMEOUT_S",
                elev.timeout.as_secs(),
            )),
            noise_m: env_parse("MOTO_ELEVATION_NOISE_M", elev.noise_m),
        };

        Self {
            valhalla,
            round_trip,
            point_to_point,
            elevation,
        }
    }

    /// User-Agent sent to public services.
    pub fn user_agent(&self) -> &str {
        &self.valhalla.user_agent
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Comma-separated numbers; `None` when unset or when nothing parses.
fn env_list(key: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = env_opt(key)?
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    (!values.is_empty()).then_some(values)
}
