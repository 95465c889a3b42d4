//! Elevation profile building: resample, fetch in batches, interpolate.

use futures::stream::{self, StreamExt};
use moto_core::{resample, ElevationOracle, ElevationProfile, GeoPoint};

use crate::config::ElevationConfig;

/// Profile for `path`, or `None` when the path is too short or no source
/// returned a single usable value.
///
/// Batches are fetched with bounded concurrency. A batch that fails on
/// `primary`, or comes back without a single value, is retried once on
/// `fallback`; if that fails too its points stay missing and are filled by
/// interpolation.
pub async fn build_profile<E: ElevationOracle>(
    primary: &E,
    fallback: Option<&E>,
    path: &[GeoPoint],
    config: &ElevationConfig,
) -> Option<ElevationProfile> {
    if path.len() < 2 {
        return None;
    }

    let points = resample(path, config.spacing_m);
    let batch_size = config.batch_size.max(1);

    let batches: Vec<Vec<Option<f64>>> = stream::iter(points.chunks(batch_size).enumerate())
        .map(|(batch, chunk)| fetch_batch(primary, fallback, batch, chunk))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;
    let samples: Vec<Option<f64>> = batches.into_iter().flatten().collect();

    let known = samples.iter().filter(|sample| sample.is_some()).count();
    tracing::debug!(
        points = points.len(),
        known,
        spacing_m = config.spacing_m,
        "elevation samples collected"
    );

    ElevationProfile::from_samples(points, samples, config.noise_m)
}

async fn fetch_batch<E: ElevationOracle>(
    primary: &E,
    fallback: Option<&E>,
    batch: usize,
    chunk: &[GeoPoint],
) -> Vec<Option<f64>> {
    let primary_miss = match primary.elevations(chunk).await {
        Ok(values) if has_data(&values) => return fit_to_batch(values, chunk.len()),
        Ok(_) => "no elevation data".to_string(),
        Err(err) => err.to_string(),
    };

    let Some(fallback) = fallback else {
        tracing::warn!(batch, "elevation batch failed: {}", primary_miss);
        return vec![None; chunk.len()];
    };

    match fallback.elevations(chunk).await {
        Ok(values) => {
            tracing::debug!(batch, "elevation batch served by fallback: {}", primary_miss);
            fit_to_batch(values, chunk.len())
        }
        Err(err) => {
            tracing::warn!(
                batch,
                "elevation batch failed on both sources: {}; {}",
                primary_miss,
                err
            );
            vec![None; chunk.len()]
        }
    }
}

/// An all-null answer is what a source returns outside its coverage.
fn has_data(values: &[Option<f64>]) -> bool {
    values.iter().any(Option::is_some)
}

/// Keep the batch aligned with its points even if a source miscounts.
fn fit_to_batch(mut values: Vec<Option<f64>>, len: usize) -> Vec<Option<f64>> {
    values.resize(len, None);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_answers_are_padded_and_long_ones_cut() {
        assert_eq!(fit_to_batch(vec![Some(1.0)], 3), vec![Some(1.0), None, None]);
        assert_eq!(fit_to_batch(vec![Some(1.0), Some(2.0)], 1), vec![Some(1.0)]);
    }

    #[test]
    fn all_null_batch_has_no_data() {
        assert!(!has_data(&[None, None]));
        assert!(!has_data(&[]));
        assert!(has_data(&[None, Some(0.0)]));
    }
}
