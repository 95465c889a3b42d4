//! Elevation profile math: resampling, gap filling and climb totals.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_m, lerp};
use crate::models::GeoPoint;

/// Elevation data aligned to a resampled path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Resampled positions.
    pub points: Vec<GeoPoint>,
    /// Raw oracle answers per position; `None` where every source failed.
    pub samples: Vec<Option<f64>>,
    /// `samples` with gaps filled by linear interpolation.
    pub elevations_m: Vec<f64>,
    pub gain_m: f64,
    pub loss_m: f64,
    pub min_m: f64,
    pub max_m: f64,
}

/// Points every `spacing_m` meters along `path`, measured cumulatively across
/// vertices. The first and last original points are always kept.
pub fn resample(path: &[GeoPoint], spacing_m: f64) -> Vec<GeoPoint> {
    if path.len() < 2 || spacing_m.is_nan() || spacing_m <= 0.0 {
        return path.to_vec();
    }

    let mut sampled = vec![path[0]];
    // Distance travelled since the last emitted sample.
    let mut carried = 0.0;

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_m = distance_m(a, b);
        if seg_m <= 0.0 {
            continue;
        }

        let mut along = spacing_m - carried;
        while along <= seg_m {
            sampled.push(lerp(a, b, along / seg_m));
            along += spacing_m;
        }
        carried = (carried + seg_m) % spacing_m;
    }

    if let Some(last) = path.last() {
        if sampled.last() != Some(last) {
            sampled.push(*last);
        }
    }
    sampled
}

/// Fill gaps linearly between the nearest known neighbours. Leading gaps
/// take the first known value, trailing gaps the last. Returns `None` when
/// no value is known at all.
pub fn interpolate_missing(samples: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<(usize, f64)> = samples
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.filter(|v| v.is_finite()).map(|v| (idx, v)))
        .collect();
    let (first_idx, first_val) = *known.first()?;
    let (last_idx, last_val) = *known.last()?;

    let mut out = vec![0.0; samples.len()];
    for value in out.iter_mut().take(first_idx + 1) {
        *value = first_val;
    }
    for value in out.iter_mut().skip(last_idx) {
        *value = last_val;
    }
    for pair in known.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let span = (i1 - i0) as f64;
        for (step, value) in out[i0..=i1].iter_mut().enumerate() {
            *value = v0 + (v1 - v0) * (step as f64 / span);
        }
    }
    Some(out)
}

/// Cumulative (gain, loss) in meters. Steps no larger than `noise_m` in
/// magnitude are ignored as sensor jitter.
pub fn climb_totals(elevations: &[f64], noise_m: f64) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in elevations.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > noise_m {
            gain += delta;
        } else if delta < -noise_m {
            loss -= delta;
        }
    }
    (gain, loss)
}

/// Project resampled elevations onto `coordinate_count` original points by
/// proportional index.
pub fn project_onto_coordinates(elevations: &[f64], coordinate_count: usize) -> Vec<Option<f64>> {
    let m = elevations.len();
    if m == 0 || coordinate_count == 0 {
        return vec![None; coordinate_count];
    }
    if coordinate_count == 1 {
        return vec![elevations.first().copied()];
    }
    (0..coordinate_count)
        .map(|i| {
            let j = (i as f64 * (m - 1) as f64 / (coordinate_count - 1) as f64).round() as usize;
            elevations.get(j).copied()
        })
        .collect()
}

impl ElevationProfile {
    /// Build a profile from resampled points and the raw per-point answers.
    pub fn from_samples(
        points: Vec<GeoPoint>,
        samples: Vec<Option<f64>>,
        noise_m: f64,
    ) -> Option<Self> {
        let elevations_m = interpolate_missing(&samples)?;
        let (gain_m, loss_m) = climb_totals(&elevations_m, noise_m);
        let min_m = elevations_m.iter().copied().fold(f64::INFINITY, f64::min);
        let max_m = elevations_m.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            points,
            samples,
            elevations_m,
            gain_m,
            loss_m,
            min_m,
            max_m,
        })
    }

    /// Elevation for each of `coordinate_count` merged path points.
    pub fn per_coordinate(&self, coordinate_count: usize) -> Vec<Option<f64>> {
        project_onto_coordinates(&self.elevations_m, coordinate_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    #[test]
    fn interpolates_interior_gap_linearly() {
        let filled =
            interpolate_missing(&[Some(100.0), None, None, None, Some(140.0)]).unwrap();
        assert_eq!(filled, vec![100.0, 110.0, 120.0, 130.0, 140.0]);
    }

    #[test]
    fn edges_take_nearest_known_value() {
        let filled = interpolate_missing(&[None, None, Some(5.0), None, Some(9.0), None]).unwrap();
        assert_eq!(filled, vec![5.0, 5.0, 5.0, 7.0, 9.0, 9.0]);
    }

    #[test]
    fn nothing_known_yields_none() {
        assert!(interpolate_missing(&[None, None]).is_none());
        assert!(interpolate_missing(&[]).is_none());
    }

    #[test]
    fn climb_ignores_jitter() {
        let (gain, loss) = climb_totals(&[100.0, 100.3, 100.1, 110.0, 104.0, 104.4], 0.5);
        assert!((gain - 9.9).abs() < 1e-9, "gain {gain}");
        assert!((loss - 6.0).abs() < 1e-9, "loss {loss}");
    }

    #[test]
    fn resample_keeps_endpoints_and_spacing() {
        let start = GeoPoint::new(45.0, 9.0);
        let mid = destination(start, 0.120, 90.0);
        let end = destination(mid, 0.110, 90.0);
        let sampled = resample(&[start, mid, end], 50.0);

        assert_eq!(sampled.first(), Some(&start));
        assert_eq!(sampled.last(), Some(&end));
        // 230 m at 50 m spacing: 0, 50, 100, 150, 200 and the endpoint.
        assert_eq!(sampled.len(), 6);
        for pair in sampled[..5].windows(2) {
            assert!((distance_m(pair[0], pair[1]) - 50.0).abs() < 0.5);
        }
    }

    #[test]
    fn resample_of_single_point_is_identity() {
        let p = GeoPoint::new(1.0, 2.0);
        assert_eq!(resample(&[p], 50.0), vec![p]);
    }

    #[test]
    fn projection_spans_both_ends() {
        let projected = project_onto_coordinates(&[1.0, 2.0, 3.0], 5);
        assert_eq!(
            projected,
            vec![Some(1.0), Some(2.0), Some(2.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn profile_reports_extremes() {
        let points = vec![GeoPoint::new(0.0, 0.0); 3];
        let profile =
            ElevationProfile::from_samples(points, vec![Some(10.0), None, Some(30.0)], 0.5)
                .unwrap();
        assert_eq!(profile.elevations_m, vec![10.0, 20.0, 30.0]);
        assert_eq!((profile.min_m, profile.max_m), (10.0, 30.0));
        assert_eq!((profile.gain_m, profile.loss_m), (20.0, 0.0));
    }
}
