//! Merge multi-leg oracle trips into one flat path.

use crate::error::ShapeError;
use crate::models::{GeoPoint, MergedPath, Trip, TurnPoint};
use crate::polyline;

/// Translate a leg-local shape index into the merged coordinate sequence.
///
/// `leg_offset` is the merged length before the leg was appended, whether or
/// not its first point was then dropped as a junction duplicate. Indices at
/// or past `merged_len` return `None`.
pub fn translate_shape_index(leg_offset: usize, leg_index: usize, merged_len: usize) -> Option<usize> {
    let global = leg_offset.checked_add(leg_index)?;
    (global < merged_len).then_some(global)
}

/// Concatenate every leg's shape, dropping duplicated junction points, and
/// resolve each maneuver to a concrete position.
///
/// Legs with an empty shape are skipped together with their maneuvers.
/// Maneuvers without an index or with an out-of-range index are dropped.
pub fn merge_trip(trip: &Trip) -> Result<MergedPath, ShapeError> {
    let mut coordinates: Vec<GeoPoint> = Vec::new();
    let mut pending: Vec<(usize, usize, &str)> = Vec::new();

    for leg in &trip.legs {
        if leg.shape.is_empty() {
            continue;
        }
        let mut leg_coords = polyline::decode(&leg.shape)?;
        if leg_coords.is_empty() {
            continue;
        }

        let leg_offset = coordinates.len();
        if coordinates.last() == leg_coords.first() {
            leg_coords.remove(0);
        }

        for maneuver in &leg.maneuvers {
            if let Some(index) = maneuver.begin_shape_index {
                pending.push((leg_offset, index, maneuver.instruction.as_str()));
            }
        }

        coordinates.extend(leg_coords);
    }

    let merged_len = coordinates.len();
    let maneuvers = pending
        .into_iter()
        .filter_map(|(offset, index, instruction)| {
            let global = translate_shape_index(offset, index, merged_len)?;
            Some(TurnPoint {
                point: coordinates[global],
                instruction: instruction.to_string(),
            })
        })
        .collect();

    Ok(MergedPath {
        coordinates,
        maneuvers,
    })
}

/// Append `start` when a round-trip path does not already end on it
/// (compared at 6 decimal places).
pub fn close_loop(path: &mut MergedPath, start: GeoPoint) {
    match path.coordinates.last() {
        Some(last) if last.same_position(&start) => {}
        Some(_) => path.coordinates.push(start),
        None => {}
    }
}
