//! Valhalla `/route` client.

use moto_core::{CostProfile, GeoPoint, OracleError, RouteRequest, RoutingOracle, Trip, TripResponse};
use reqwest::{header, Client};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::retry::Backoff;
use crate::transport_error;

#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Primary service root, without the `/route` suffix.
    pub url: String,
    /// Tried only after every attempt against `url` failed.
    pub fallback_url: Option<String>,
    pub timeout: Duration,
    /// Extra attempts per endpoint after a transport failure.
    pub retries: u32,
    pub retry_base: Duration,
    pub user_agent: String,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8002".to_string(),
            fallback_url: None,
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_base: Duration::from_millis(250),
            user_agent: "MotoRoute/1.1".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Location {
    lat: f64,
    lon: f64,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions {
    units: &'static str,
}

#[derive(Debug, Serialize)]
struct RoutePayload {
    locations: Vec<Location>,
    costing: &'static str,
    costing_options: BTreeMap<&'static str, CostProfile>,
    directions_options: DirectionsOptions,
}

fn route_payload(request: &RouteRequest) -> RoutePayload {
    let locations = request
        .locations
        .points()
        .iter()
        .map(|GeoPoint { lat, lon }| Location {
            lat: *lat,
            lon: *lon,
            kind: "break",
        })
        .collect();
    let costing = request.profile.costing;
    RoutePayload {
        locations,
        costing,
        costing_options: BTreeMap::from([(costing, request.profile)]),
        directions_options: DirectionsOptions {
            units: "kilometers",
        },
    }
}

/// Routing oracle backed by one or two Valhalla instances.
#[derive(Debug, Clone)]
pub struct ValhallaClient {
    client: Client,
    endpoints: Vec<String>,
    retries: u32,
    retry_base: Duration,
}

impl ValhallaClient {
    pub fn new(config: &ValhallaConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(transport_error)?;

        let endpoints = std::iter::once(config.url.as_str())
            .chain(config.fallback_url.as_deref())
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(|url| format!("{url}/route"))
            .collect();

        Ok(Self {
            client,
            endpoints,
            retries: config.retries,
            retry_base: config.retry_base,
        })
    }

    /// `/route` URLs in the order they are tried.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn post_with_retries(
        &self,
        endpoint: &str,
        payload: &RoutePayload,
    ) -> Result<Trip, OracleError> {
        let mut backoff = Backoff::new(self.retry_base, self.retry_base.saturating_mul(8));
        let mut attempt = 0u32;
        loop {
            match self.post_once(endpoint, payload).await {
                Err(OracleError::Transport(err)) if attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff.fail();
                    tracing::debug!(
                        endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "routing oracle transport error, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn post_once(&self, endpoint: &str, payload: &RoutePayload) -> Result<Trip, OracleError> {
        let response = self
            .client
            .post(endpoint)
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: TripResponse =
            serde_json::from_str(&body).map_err(|err| OracleError::Decode(err.to_string()))?;
        parsed.trip.ok_or(OracleError::MissingTrip)
    }
}

impl RoutingOracle for ValhallaClient {
    async fn route(&self, request: &RouteRequest) -> Result<Trip, OracleError> {
        let payload = route_payload(request);
        let mut last_error = OracleError::NotConfigured;

        for endpoint in &self.endpoints {
            match self.post_with_retries(endpoint, &payload).await {
                Ok(trip) => return Ok(trip),
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, "routing oracle call failed: {}", err);
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}
