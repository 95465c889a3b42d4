//! Self-overlap heuristic for candidate loops.
//!
//! Counts how often a subsampled path comes back within a few meters of an
//! earlier part of itself, or crosses it. Used only to rank candidates that
//! already fit the distance band.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_to_segment_m, segments_cross};
use crate::models::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapConfig {
    /// Sample-to-segment distance that counts as retracing.
    pub proximity_m: f64,
    /// Minimum separation, in samples, between compared positions.
    pub min_index_gap: usize,
    /// Upper bound on samples taken from the path.
    pub max_samples: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            proximity_m: 15.0,
            min_index_gap: 3,
            max_samples: 256,
        }
    }
}

/// Retracing score of `path`; higher means more self-overlap.
///
/// The path is subsampled to at most `max_samples` points, so the pair count
/// is bounded by `max_samples²` regardless of input length. Each sample is
/// tested against every subsampled segment whose endpoints are at least
/// `min_index_gap` samples away, and every such pair of segments is tested
/// for a crossing. On a closed loop the gap wraps, so the shared start/end
/// does not count.
///
/// Distances are planar, measured in the local east/north plane of each
/// segment (see [`distance_to_segment_m`]). Over the few meters of
/// `proximity_m` this agrees with the geodesic distance.
pub fn overlap_score(path: &[GeoPoint], config: &OverlapConfig) -> usize {
    let samples = subsample(path, config.max_samples.max(2));
    let n = samples.len();
    if n < 3 {
        return 0;
    }

    let closed = samples
        .first()
        .zip(samples.last())
        .is_some_and(|(first, last)| first.same_position(last));
    let min_gap = config.min_index_gap.max(1);

    let gap = |i: usize, j: usize| -> usize {
        let direct = i.abs_diff(j);
        if closed {
            direct.min((n - 1) - direct)
        } else {
            direct
        }
    };

    let mut score = 0usize;
    for i in 0..n {
        for j in 0..n - 1 {
            if gap(i, j) < min_gap || gap(i, j + 1) < min_gap {
                continue;
            }
            // Each unordered retrace is counted from the later sample only.
            if j < i
                && distance_to_segment_m(samples[i], samples[j], samples[j + 1])
                    < config.proximity_m
            {
                score += 1;
            }
        }
    }

    for i in 0..n - 1 {
        for j in i + 1..n - 1 {
            let apart = [(i, j), (i, j + 1), (i + 1, j), (i + 1, j + 1)]
                .iter()
                .all(|&(a, b)| gap(a, b) >= min_gap);
            if apart && segments_cross(samples[i], samples[i + 1], samples[j], samples[j + 1]) {
                score += 1;
            }
        }
    }
    score
}

/// Evenly strided subsample that always keeps the last point.
fn subsample(path: &[GeoPoint], max_samples: usize) -> Vec<GeoPoint> {
    if path.len() <= max_samples {
        return path.to_vec();
    }
    let stride = path.len().div_ceil(max_samples - 1);
    let mut out: Vec<GeoPoint> = path.iter().step_by(stride).copied().collect();
    if let Some(last) = path.last() {
        if out.last() != Some(last) {
            out.push(*last);
        }
    }
    out
}
