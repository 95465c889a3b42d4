//! Elevation lookups against OpenTopoData-compatible services.
//!
//! OpenTopoData and Open-Elevation share the same GET interface:
//! `?locations=lat,lon|lat,lon…` answered by `{"results":[{"elevation":…}]}`.

use moto_core::{ElevationOracle, GeoPoint, OracleError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::transport_error;

pub const OPENTOPODATA_EUDEM25M_URL: &str = "https://api.opentopodata.org/v1/eudem25m";
pub const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

/// One elevation service. Batching and fallback between services is the
/// caller's job.
#[derive(Debug, Clone)]
pub struct ElevationClient {
    client: Client,
    url: String,
}

impl ElevationClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            url: url.into().trim().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn locations_param(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat, p.lon))
        .collect::<Vec<_>>()
        .join("|")
}

impl ElevationOracle for ElevationClient {
    async fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<Option<f64>>, OracleError> {
        if self.url.is_empty() {
            return Err(OracleError::NotConfigured);
        }
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(&self.url)
            .query(&[("locations", locations_param(points))])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let payload: LookupResponse =
            serde_json::from_str(&body).map_err(|err| OracleError::Decode(err.to_string()))?;

        if payload.results.len() != points.len() {
            return Err(OracleError::Decode(format!(
                "expected {} elevation results, got {}",
                points.len(),
                payload.results.len()
            )));
        }

        Ok(payload
            .results
            .into_iter()
            .map(|result| result.elevation.filter(|value| value.is_finite()))
            .collect())
    }
}
