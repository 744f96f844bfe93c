//! Blocking HTTP client for the production factor aggregator.
//!
//! Enabled with the `http` feature. The aggregator exposes
//! `GET {endpoint}/factors/v1/{cell}?at={rfc3339}` returning the four
//! factors as JSON.

use std::time::Duration;

use chrono::{DateTime, Utc};
use h3o::CellIndex;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{ExternalFactors, FactorProvider};
use crate::error::CollaboratorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct FactorResponse {
    weather: f64,
    traffic: f64,
    event: f64,
    poi: f64,
}

/// Thin HTTP client for the factor aggregator.
#[derive(Debug, Clone)]
pub struct HttpFactorProvider {
    client: Client,
    endpoint: String,
}

impl HttpFactorProvider {
    /// Create a client for the given aggregator endpoint
    /// (e.g. `http://factors.internal:8080`).
    pub fn new(endpoint: &str) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CollaboratorError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl FactorProvider for HttpFactorProvider {
    fn get_factors(
        &self,
        cell: CellIndex,
        at: DateTime<Utc>,
    ) -> Result<ExternalFactors, CollaboratorError> {
        let url = format!("{}/factors/v1/{}", self.endpoint, cell);
        let response = self
            .client
            .get(url)
            .query(&[("at", at.to_rfc3339())])
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    CollaboratorError::Timeout(err.to_string())
                } else {
                    CollaboratorError::Unavailable(err.to_string())
                }
            })?;

        let parsed: FactorResponse = response
            .json()
            .map_err(|err| CollaboratorError::Malformed(err.to_string()))?;

        Ok(ExternalFactors {
            weather: parsed.weather,
            traffic: parsed.traffic,
            event: parsed.event,
            poi: parsed.poi,
        }
        .clamped())
    }
}
