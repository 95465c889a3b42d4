//! Adaptive correction: query the routing oracle, inspect the distance it
//! reports, and adjust the inputs until the trip fits.
//!
//! Every run owns its [`CorrectionState`]; nothing is shared between runs,
//! so independent runs may execute concurrently. Oracle calls inside a run
//! are strictly sequential because each attempt depends on the last one.

use moto_core::geo::{distance_km, path_length_km};
use moto_core::{
    close_loop, merge_trip, overlap_score, synthesize_round_trip_waypoints, DistanceBand,
    GeoPoint, OverlapConfig, RouteCandidate, RouteError, RouteRequest, RouteStyle,
    RoutingOracle, StyleLadder, TripKind, WaypointSet,
};

use crate::config::{PointToPointConfig, RoundTripConfig};

/// Mutable state of one correction run.
#[derive(Debug, Clone)]
pub struct CorrectionState {
    /// Synthesis radius; round trips only.
    pub radius_km: Option<f64>,
    /// Waypoints still in play; shrinks during point-to-point reduction.
    pub waypoints: Vec<GeoPoint>,
    pub ladder: StyleLadder,
    pub attempts_used: u32,
    /// Whether any oracle call returned a trip.
    pub responded: bool,
    /// Out-of-band response nearest to the band so far.
    pub closest: Option<RouteCandidate>,
}

impl CorrectionState {
    fn new(radius_km: Option<f64>, waypoints: Vec<GeoPoint>, ladder: StyleLadder) -> Self {
        Self {
            radius_km,
            waypoints,
            ladder,
            attempts_used: 0,
            responded: false,
            closest: None,
        }
    }

    pub fn style(&self) -> RouteStyle {
        self.ladder.current()
    }

    fn record_miss(&mut self, candidate: RouteCandidate, band: &DistanceBand) {
        if candidate.path.is_empty() {
            return;
        }
        let better = self.closest.as_ref().map_or(true, |best| {
            band.miss_km(candidate.distance_km) < band.miss_km(best.distance_km)
        });
        if better {
            self.closest = Some(candidate);
        }
    }

    /// Terminal error for a run that never produced an in-band trip.
    fn exhausted(self) -> RouteError {
        if self.responded {
            RouteError::CannotMeetConstraints {
                attempts: self.attempts_used,
                closest: self.closest.map(Box::new),
            }
        } else {
            RouteError::OracleUnavailable {
                attempts: self.attempts_used,
            }
        }
    }
}

/// What a single oracle call amounted to.
enum Evaluation {
    Accepted(RouteCandidate),
    Missed,
}

/// Shared query/evaluate step. Transport and status failures, missing
/// distances and empty paths are all plain misses; only a malformed shape
/// aborts the run.
async fn query<R: RoutingOracle>(
    oracle: &R,
    state: &mut CorrectionState,
    kind: TripKind,
    locations: WaypointSet,
    band: &DistanceBand,
    bearing_deg: Option<f64>,
    overlap: &OverlapConfig,
) -> Result<Evaluation, RouteError> {
    let style = state.style();
    let request = RouteRequest::new(locations, style);
    state.attempts_used += 1;
    let attempt = state.attempts_used;

    let trip = match oracle.route(&request).await {
        Ok(trip) => trip,
        Err(err) => {
            tracing::warn!(attempt, %style, "routing oracle call failed: {}", err);
            return Ok(Evaluation::Missed);
        }
    };
    state.responded = true;

    let Some(distance_km) = trip.length_km() else {
        tracing::warn!(attempt, %style, "routing oracle reported no distance");
        return Ok(Evaluation::Missed);
    };

    let mut path = merge_trip(&trip)?;
    if kind == TripKind::RoundTrip {
        if let Some(start) = request.locations.points().first() {
            close_loop(&mut path, *start);
        }
    }

    let in_band = band.contains(distance_km) && !path.is_empty();
    tracing::info!(
        attempt,
        %style,
        radius_km = state.radius_km,
        distance_km,
        in_band,
        "routing oracle answered"
    );

    let overlap_score = if in_band {
        overlap_score(&path.coordinates, overlap)
    } else {
        0
    };
    let candidate = RouteCandidate {
        kind,
        path,
        distance_km,
        duration_s: trip.summary.time.filter(|time| time.is_finite()),
        style,
        locations: request.locations,
        radius_km: state.radius_km,
        bearing_deg,
        attempts: attempt,
        overlap_score,
    };

    if in_band {
        Ok(Evaluation::Accepted(candidate))
    } else {
        state.record_miss(candidate, band);
        Ok(Evaluation::Missed)
    }
}

/// Initial synthesis radius.
///
/// Estimates each candidate loop as its straight-line perimeter times the
/// detour factor. Without user waypoints the radii are tried largest first
/// and the first estimate not above the band maximum wins. With user
/// waypoints they already add length, so radii are tried smallest first and
/// the first estimate reaching the band minimum wins. When nothing
/// qualifies the last radius tried is used.
pub fn seed_radius(
    start: GeoPoint,
    base_bearing_deg: f64,
    user: &[GeoPoint],
    config: &RoundTripConfig,
) -> f64 {
    let mut radii: Vec<f64> = config
        .seed_radii_km
        .iter()
        .copied()
        .filter(|radius| radius.is_finite() && *radius > 0.0)
        .collect();
    radii.sort_by(|a, b| b.total_cmp(a));
    if !user.is_empty() {
        radii.reverse();
    }

    let estimate = |radius: f64| {
        let via = synthesize_round_trip_waypoints(
            start,
            base_bearing_deg,
            user,
            radius,
            config.target_waypoints,
        );
        let loop_points = WaypointSet::round_trip(start, &via);
        path_length_km(loop_points.points(), false) * config.detour_factor
    };

    let chosen = radii
        .iter()
        .copied()
        .find(|radius| {
            let km = estimate(*radius);
            if user.is_empty() {
                km <= config.band.max_km
            } else {
                km >= config.band.min_km
            }
        })
        .or_else(|| radii.last().copied())
        .unwrap_or(config.min_radius_km);

    chosen.clamp(config.min_radius_km, config.max_radius_km.max(config.min_radius_km))
}

/// Round-trip correction along one base bearing.
///
/// Each failed attempt shrinks the radius by the decay factor, floored at
/// the minimum radius. From the second failure on the style also moves one
/// step down the ladder. Stops after `max_attempts` oracle calls.
pub async fn correct_round_trip<R: RoutingOracle>(
    oracle: &R,
    start: GeoPoint,
    base_bearing_deg: f64,
    user_waypoints: &[GeoPoint],
    ladder: StyleLadder,
    config: &RoundTripConfig,
) -> Result<RouteCandidate, RouteError> {
    let radius = seed_radius(start, base_bearing_deg, user_waypoints, config);
    let mut state = CorrectionState::new(Some(radius), user_waypoints.to_vec(), ladder);
    let budget = config.max_attempts.max(1);
    let mut reductions = 0u32;

    tracing::debug!(
        base_bearing_deg,
        radius_km = radius,
        budget,
        "round-trip correction seeded"
    );

    while state.attempts_used < budget {
        let radius_km = state.radius_km.unwrap_or(radius);
        let via = synthesize_round_trip_waypoints(
            start,
            base_bearing_deg,
            &state.waypoints,
            radius_km,
            config.target_waypoints,
        );
        let locations = WaypointSet::round_trip(start, &via);

        match query(
            oracle,
            &mut state,
            TripKind::RoundTrip,
            locations,
            &config.band,
            Some(base_bearing_deg),
            &config.overlap,
        )
        .await?
        {
            Evaluation::Accepted(candidate) => return Ok(candidate),
            Evaluation::Missed => {}
        }

        reductions += 1;
        state.radius_km = Some((radius_km * config.decay).max(config.min_radius_km));
        if reductions > 1 {
            if let Some(style) = state.ladder.next() {
                tracing::debug!(%style, "degrading route style");
            }
        }
    }

    tracing::info!(attempts = state.attempts_used, "round-trip budget exhausted");
    Err(state.exhausted())
}

/// Detour a waypoint adds over the direct start to end line.
pub fn deviation_score(start: GeoPoint, end: GeoPoint, waypoint: GeoPoint) -> f64 {
    distance_km(start, waypoint) + distance_km(waypoint, end) - distance_km(start, end)
}

/// Index of the waypoint with the largest deviation; first one on ties.
fn worst_offender(start: GeoPoint, end: GeoPoint, waypoints: &[GeoPoint]) -> Option<usize> {
    let mut worst: Option<(usize, f64)> = None;
    for (idx, waypoint) in waypoints.iter().enumerate() {
        let score = deviation_score(start, end, *waypoint);
        if worst.map_or(true, |(_, best)| score > best) {
            worst = Some((idx, score));
        }
    }
    worst.map(|(idx, _)| idx)
}

/// Point-to-point correction.
///
/// While the trip is over `max_km`, drop the waypoint with the largest
/// deviation score; once none remain, step down the style ladder. Ends when
/// there is nothing left to drop or degrade, so the number of calls is at
/// most waypoints plus ladder steps.
pub async fn correct_point_to_point<R: RoutingOracle>(
    oracle: &R,
    start: GeoPoint,
    end: GeoPoint,
    waypoints: &[GeoPoint],
    ladder: StyleLadder,
    config: &PointToPointConfig,
) -> Result<RouteCandidate, RouteError> {
    let band = DistanceBand::at_most(config.max_km);
    let mut state = CorrectionState::new(None, waypoints.to_vec(), ladder);

    loop {
        let locations = WaypointSet::point_to_point(start, &state.waypoints, end);
        match query(
            oracle,
            &mut state,
            TripKind::PointToPoint,
            locations,
            &band,
            None,
            &config.overlap,
        )
        .await?
        {
            Evaluation::Accepted(candidate) => return Ok(candidate),
            Evaluation::Missed => {}
        }

        if let Some(idx) = worst_offender(start, end, &state.waypoints) {
            let dropped = state.waypoints.remove(idx);
            tracing::debug!(
                lat = dropped.lat,
                lon = dropped.lon,
                remaining = state.waypoints.len(),
                "dropping waypoint with largest detour"
            );
        } else if let Some(style) = state.ladder.next() {
            tracing::debug!(%style, "degrading route style");
        } else {
            break;
        }
    }

    tracing::info!(attempts = state.attempts_used, "point-to-point reductions exhausted");
    Err(state.exhausted())
}

/// Preferred of two in-band candidates: lower overlap first, then the
/// distance nearer the band midpoint.
pub fn better_candidate<'a>(
    a: &'a RouteCandidate,
    b: &'a RouteCandidate,
    band: &DistanceBand,
) -> &'a RouteCandidate {
    let mid = band.midpoint();
    let key = |c: &RouteCandidate| (c.overlap_score, (c.distance_km - mid).abs());
    let (ka, kb) = (key(a), key(b));
    if kb.0 < ka.0 || (kb.0 == ka.0 && kb.1 < ka.1) {
        b
    } else {
        a
    }
}
