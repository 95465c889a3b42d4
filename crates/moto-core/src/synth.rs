//! Round-trip waypoint synthesis.
//!
//! A loop is shaped by three angular slots around the start: the base
//! bearing and ±40° either side. User waypoints claim the slot nearest to
//! their own bearing; empty slots are filled by projecting `radius_km`
//! along the slot bearing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::{angular_difference, destination, initial_bearing, normalize_bearing};
use crate::models::GeoPoint;

/// Angular offset of the side slots from the base bearing.
pub const SLOT_SPREAD_DEG: f64 = 40.0;
/// Number of angular slots around the start.
pub const SLOT_COUNT: usize = 3;

/// Eight-point compass direction for a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    /// Base bearing used when the rider leaves the direction open.
    pub const DEFAULT: Compass = Compass::NE;

    pub fn bearing(&self) -> f64 {
        match self {
            Compass::N => 0.0,
            Compass::NE => 45.0,
            Compass::E => 90.0,
            Compass::SE => 135.0,
            Compass::S => 180.0,
            Compass::SW => 225.0,
            Compass::W => 270.0,
            Compass::NW => 315.0,
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compass direction '{0}'")]
pub struct UnknownDirection(pub String);

impl FromStr for Compass {
    type Err = UnknownDirection;

    /// Accepts English abbreviations and the Italian `O`/`SO`/`NO` forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Compass::N),
            "NE" => Ok(Compass::NE),
            "E" => Ok(Compass::E),
            "SE" => Ok(Compass::SE),
            "S" => Ok(Compass::S),
            "SW" | "SO" => Ok(Compass::SW),
            "W" | "O" => Ok(Compass::W),
            "NW" | "NO" => Ok(Compass::NW),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

/// Slot bearings for a base bearing: `[base-40, base, base+40]`, each in `[0, 360)`.
pub fn slot_bearings(base_bearing_deg: f64) -> [f64; SLOT_COUNT] {
    [
        normalize_bearing(base_bearing_deg - SLOT_SPREAD_DEG),
        normalize_bearing(base_bearing_deg),
        normalize_bearing(base_bearing_deg + SLOT_SPREAD_DEG),
    ]
}

/// Where a slot's point came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SlotFill {
    /// The user waypoint at this index of the input list.
    User { index: usize, point: GeoPoint },
    Synthesized { point: GeoPoint },
}

impl SlotFill {
    pub fn point(&self) -> GeoPoint {
        match self {
            SlotFill::User { point, .. } | SlotFill::Synthesized { point } => *point,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, SlotFill::User { .. })
    }
}

/// Assign user waypoints to slots and fill the rest.
///
/// Each user waypoint goes to the slot whose bearing is circularly nearest
/// to its own bearing from `start` (first slot wins ties). If that slot is
/// taken it cascades to the first empty slot in index order. User waypoints
/// beyond the slot count are never dropped: they are appended after the
/// slots. The result is truncated to `target_count`, but never below the
/// number of user waypoints.
pub fn distribute_slots(
    start: GeoPoint,
    base_bearing_deg: f64,
    user_waypoints: &[GeoPoint],
    radius_km: f64,
    target_count: usize,
) -> Vec<SlotFill> {
    let bearings = slot_bearings(base_bearing_deg);
    let mut slots: [Option<SlotFill>; SLOT_COUNT] = [None; SLOT_COUNT];
    let mut overflow = Vec::new();

    for (index, point) in user_waypoints.iter().copied().enumerate() {
        let fill = SlotFill::User { index, point };
        let bearing = initial_bearing(start, point);
        let nearest = nearest_slot(&bearings, bearing);

        if slots[nearest].is_none() {
            slots[nearest] = Some(fill);
        } else if let Some(empty) = slots.iter().position(Option::is_none) {
            tracing::debug!(
                waypoint = index,
                nearest,
                slot = empty,
                "slot taken, cascading user waypoint"
            );
            slots[empty] = Some(fill);
        } else {
            overflow.push(fill);
        }
    }

    let mut filled: Vec<SlotFill> = slots
        .iter()
        .zip(bearings)
        .map(|(slot, bearing)| {
            slot.unwrap_or_else(|| SlotFill::Synthesized {
                point: destination(start, radius_km, bearing),
            })
        })
        .collect();
    filled.extend(overflow);

    let keep = target_count.max(user_waypoints.len()).min(filled.len());
    if keep < filled.len() {
        // Drop synthesized points from the tail first so user points survive.
        let mut drop = filled.len() - keep;
        let mut idx = filled.len();
        while drop > 0 && idx > 0 {
            idx -= 1;
            if !filled[idx].is_user() {
                filled.remove(idx);
                drop -= 1;
            }
        }
    }
    filled
}

/// Points only, in slot order.
pub fn synthesize_round_trip_waypoints(
    start: GeoPoint,
    base_bearing_deg: f64,
    user_waypoints: &[GeoPoint],
    radius_km: f64,
    target_count: usize,
) -> Vec<GeoPoint> {
    distribute_slots(start, base_bearing_deg, user_waypoints, radius_km, target_count)
        .iter()
        .map(SlotFill::point)
        .collect()
}

fn nearest_slot(bearings: &[f64; SLOT_COUNT], bearing: f64) -> usize {
    let mut best = 0usize;
    let mut best_diff = f64::INFINITY;
    for (idx, slot) in bearings.iter().enumerate() {
        let diff = angular_difference(bearing, *slot);
        if diff < best_diff {
            best = idx;
            best_diff = diff;
        }
    }
    best
}
