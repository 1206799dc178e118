mod classifier;
mod distance;
mod places;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use roadside_core::{
    ClassifierError, DistanceError, DistanceEstimate, LookupError, PlacesOutcome,
};
use serde_json::Value;

pub use classifier::{ClassifierConfig, OpenAiClassifier};
pub use distance::GoogleDistanceMatrix;
pub use places::GooglePlacesLookup;

/// Language-model classifier: one JSON payload in, one JSON object out.
pub trait Classifier: Send + Sync {
    async fn classify(&self, payload: &Value) -> Result<Value, ClassifierError>;
}

/// Free-text place search.
pub trait PlacesLookup: Send + Sync {
    async fn search(&self, query: &str) -> Result<PlacesOutcome, LookupError>;
}

/// Road distance and travel time between two free-text locations.
pub trait DistanceGateway: Send + Sync {
    async fn distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DistanceEstimate, DistanceError>;
}

/// Settings shared by the Google Maps backed gateways.
#[derive(Debug, Clone)]
pub struct MapsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl MapsConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://maps.googleapis.com";

    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(6)))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}
