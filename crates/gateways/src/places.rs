use anyhow::Result;
use reqwest::Client;
use roadside_core::{LookupError, PlacesOutcome};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{build_http_client, MapsConfig, PlacesLookup};

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";

/// Google Places text search.
pub struct GooglePlacesLookup {
    client: Client,
    config: MapsConfig,
}

impl GooglePlacesLookup {
    pub fn new(config: MapsConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout)?,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    error_message: Option<String>,
}

impl PlacesLookup for GooglePlacesLookup {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<PlacesOutcome, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        let api_key = self.config.api_key().ok_or(LookupError::NotConfigured)?;

        let response = self
            .client
            .get(self.config.endpoint(TEXT_SEARCH_PATH))
            .query(&[("query", query), ("key", api_key)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Provider {
                status: format!("HTTP {}", status.as_u16()),
                message: Some(body),
            });
        }

        let body: TextSearchResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::InvalidResponse(err.to_string())
            }
        })?;

        match body.status.as_str() {
            "OK" if !body.results.is_empty() => {
                info!(results = body.results.len(), "places search matched");
                Ok(PlacesOutcome::Found(body.results))
            }
            "OK" | "ZERO_RESULTS" => {
                debug!("places search matched nothing");
                Ok(PlacesOutcome::NoResults)
            }
            other => {
                warn!(status = other, "places provider rejected search");
                Err(LookupError::Provider {
                    status: other.to_string(),
                    message: body.error_message,
                })
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(err.to_string())
    }
}
