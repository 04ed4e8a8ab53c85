//! Client for the routing provider that turns a station pair into a rail
//! or road distance.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, Result};

const METERS_PER_KILOMETER: i64 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Route {
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    distance: LegDistance,
}

#[derive(Debug, Deserialize)]
struct LegDistance {
    value: i64,
}

pub struct DirectionsClient {
    client: Client,
    base: String,
    key: String,
}

impl DirectionsClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_base(&settings.directions_api_base, &settings.directions_api_key)
    }

    pub fn with_base(base: &str, key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Io(e.to_string()))?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// Rail distance between two settlements in whole kilometers, falling
    /// back to road distance when no train route exists. Fractional
    /// kilometers are dropped.
    pub async fn distance_km(&self, origin: &str, destination: &str) -> Result<i64> {
        if let Some(meters) = self
            .leg_meters(origin, destination, "transit", Some("train"))
            .await?
        {
            return Ok(meters / METERS_PER_KILOMETER);
        }
        debug!(origin, destination, "no train route, falling back to driving");
        match self.leg_meters(origin, destination, "driving", None).await? {
            Some(meters) => Ok(meters / METERS_PER_KILOMETER),
            None => Err(AppError::DistanceUnavailable(format!(
                "no route between {origin} and {destination}"
            ))),
        }
    }

    /// One directions query. `Ok(None)` means the provider answered but has
    /// no route for this travel mode; provider rejections are errors.
    async fn leg_meters(
        &self,
        origin: &str,
        destination: &str,
        mode: &str,
        transit_mode: Option<&str>,
    ) -> Result<Option<i64>> {
        let url = format!("{}/maps/api/directions/json", self.base);
        let mut query: Vec<(&str, &str)> = vec![
            ("origin", origin),
            ("destination", destination),
            ("mode", mode),
            ("key", &self.key),
        ];
        if let Some(tm) = transit_mode {
            query.push(("transit_mode", tm));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::DistanceUnavailable(e.to_string()))?;
        let http_status = response.status();
        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::DistanceUnavailable(e.to_string()))?;
        debug!(mode, provider_status = %body.status, http = %http_status, "directions response");

        if !http_status.is_success() {
            return Err(AppError::DistanceUnavailable(
                body.error_message
                    .unwrap_or_else(|| format!("HTTP {http_status}")),
            ));
        }
        match body.status.as_str() {
            // distance is always taken from the first route's first leg
            "OK" => Ok(body
                .routes
                .first()
                .and_then(|r| r.legs.first())
                .map(|l| l.distance.value)),
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(None),
            other => Err(AppError::DistanceUnavailable(
                body.error_message.unwrap_or_else(|| other.to_string()),
            )),
        }
    }
}
