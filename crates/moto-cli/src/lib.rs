//! Moto CLI - argument parsing and JSON reports for the `moto-route` binary.

use chrono::{DateTime, Utc};
use moto_core::{ElevationProfile, GeoPoint, RouteCandidate, RouteStyle, TripKind, TurnPoint};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointParseError {
    #[error("expected 'lat,lon', got '{0}'")]
    Format(String),
    #[error("coordinate out of range: '{0}'")]
    Range(String),
}

/// Parse `"lat,lon"` in decimal degrees.
pub fn parse_point(s: &str) -> Result<GeoPoint, PointParseError> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| PointParseError::Format(s.to_string()))?;
    let lat = f64::from_str(lat.trim()).map_err(|_| PointParseError::Format(s.to_string()))?;
    let lon = f64::from_str(lon.trim()).map_err(|_| PointParseError::Format(s.to_string()))?;
    let point = GeoPoint::new(lat, lon);
    if !point.is_valid() {
        return Err(PointParseError::Range(s.to_string()));
    }
    Ok(point)
}

#[derive(Debug, Serialize)]
pub struct ElevationSummary {
    pub gain_m: f64,
    pub loss_m: f64,
    pub min_m: f64,
    pub max_m: f64,
    pub samples: usize,
}

impl From<&ElevationProfile> for ElevationSummary {
    fn from(profile: &ElevationProfile) -> Self {
        Self {
            gain_m: profile.gain_m,
            loss_m: profile.loss_m,
            min_m: profile.min_m,
            max_m: profile.max_m,
            samples: profile.points.len(),
        }
    }
}

/// Track point with its projected elevation.
#[derive(Debug, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

/// What `moto-route` prints for an accepted route or a closest miss.
#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub generated_at: DateTime<Utc>,
    /// `accepted` or `closest_miss`.
    pub status: &'static str,
    pub kind: TripKind,
    pub distance_km: f64,
    pub duration_s: Option<f64>,
    pub style: RouteStyle,
    pub locations: Vec<GeoPoint>,
    pub radius_km: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub attempts: u32,
    pub overlap_score: usize,
    pub coordinate_count: usize,
    pub maneuvers: Vec<TurnPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<ElevationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<Vec<TrackPoint>>,
}

impl RouteReport {
    pub fn new(
        status: &'static str,
        candidate: &RouteCandidate,
        profile: Option<&ElevationProfile>,
        with_track: bool,
    ) -> Self {
        let coordinates = &candidate.path.coordinates;
        let track = with_track.then(|| {
            let elevations = profile
                .map(|profile| profile.per_coordinate(coordinates.len()))
                .unwrap_or_else(|| vec![None; coordinates.len()]);
            coordinates
                .iter()
                .zip(elevations)
                .map(|(point, ele)| TrackPoint {
                    lat: point.lat,
                    lon: point.lon,
                    ele,
                })
                .collect()
        });

        Self {
            generated_at: Utc::now(),
            status,
            kind: candidate.kind,
            distance_km: candidate.distance_km,
            duration_s: candidate.duration_s,
            style: candidate.style,
            locations: candidate.locations.points().to_vec(),
            radius_km: candidate.radius_km,
            bearing_deg: candidate.bearing_deg,
            attempts: candidate.attempts,
            overlap_score: candidate.overlap_score,
            coordinate_count: coordinates.len(),
            maneuvers: candidate.path.maneuvers.clone(),
            elevation: profile.map(ElevationSummary::from),
            track,
        }
    }
}
