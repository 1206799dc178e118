use anyhow::Result;
use reqwest::Client;
use roadside_core::{normalize_text, DistanceError, DistanceEstimate};
use serde::Deserialize;
use tracing::instrument;

use crate::{build_http_client, DistanceGateway, MapsConfig};

const DISTANCE_MATRIX_PATH: &str = "/maps/api/distancematrix/json";

/// Google Distance Matrix, one origin and one destination per call.
pub struct GoogleDistanceMatrix {
    client: Client,
    config: MapsConfig,
}

impl GoogleDistanceMatrix {
    pub fn new(config: MapsConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout)?,
            config,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    origin_addresses: Vec<String>,
    #[serde(default)]
    destination_addresses: Vec<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

impl DistanceGateway for GoogleDistanceMatrix {
    #[instrument(skip(self))]
    async fn distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DistanceEstimate, DistanceError> {
        let api_key = self.config.api_key().ok_or(DistanceError::NotConfigured)?;
        let origin = normalize_text(origin);
        let destination = normalize_text(destination);

        let response = self
            .client
            .get(self.config.endpoint(DISTANCE_MATRIX_PATH))
            .query(&[
                ("origins", origin.as_str()),
                ("destinations", destination.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DistanceError::Provider {
                status: format!("HTTP {}", status.as_u16()),
                message: Some(body),
            });
        }

        let body: MatrixResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                DistanceError::Timeout
            } else {
                DistanceError::InvalidResponse(err.to_string())
            }
        })?;

        if body.status != "OK" {
            return Err(DistanceError::Provider {
                status: body.status,
                message: body.error_message,
            });
        }

        let element = body
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| DistanceError::InvalidResponse("no matrix element".to_string()))?;
        if element.status != "OK" {
            return Err(DistanceError::Provider {
                status: element.status,
                message: None,
            });
        }

        let (Some(distance), Some(duration)) = (element.distance, element.duration) else {
            return Err(DistanceError::InvalidResponse(
                "matrix element lacks distance or duration".to_string(),
            ));
        };

        Ok(DistanceEstimate {
            origin: body.origin_addresses.into_iter().next().unwrap_or(origin),
            destination: body
                .destination_addresses
                .into_iter()
                .next()
                .unwrap_or(destination),
            distance_meters: distance.value,
            distance_text: distance.text,
            duration_seconds: duration.value,
            duration_text: duration.text,
        })
    }
}

fn transport_error(err: reqwest::Error) -> DistanceError {
    if err.is_timeout() {
        DistanceError::Timeout
    } else {
        DistanceError::Transport(err.to_string())
    }
}
