use std::env;
use std::time::Duration;

use roadside_core::DEFAULT_LOCALITY;
use roadside_gateways::{ClassifierConfig, MapsConfig};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_CLASSIFIER_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_LOOKUP_TIMEOUT_SECONDS: u64 = 10;

/// Runtime settings for the HTTP service, read from `ROADSIDE_*` variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub classifier: ClassifierConfig,
    pub maps: MapsConfig,
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let seconds = |key: &str, default: u64| {
            Duration::from_secs(
                read(key)
                    .and_then(|value| value.parse::<u64>().ok())
                    .filter(|value| *value > 0)
                    .unwrap_or(default),
            )
        };

        let classifier = ClassifierConfig {
            api_key: read("ROADSIDE_OPENAI_API_KEY"),
            model: read("ROADSIDE_OPENAI_MODEL")
                .unwrap_or_else(|| ClassifierConfig::DEFAULT_MODEL.to_string()),
            base_url: read("ROADSIDE_OPENAI_BASE_URL")
                .unwrap_or_else(|| ClassifierConfig::DEFAULT_BASE_URL.to_string()),
            default_locality: read("ROADSIDE_DEFAULT_LOCALITY")
                .unwrap_or_else(|| DEFAULT_LOCALITY.to_string()),
            timeout: seconds(
                "ROADSIDE_CLASSIFIER_TIMEOUT_SECONDS",
                DEFAULT_CLASSIFIER_TIMEOUT_SECONDS,
            ),
        };

        let maps = MapsConfig {
            api_key: read("ROADSIDE_GOOGLE_MAPS_API_KEY"),
            base_url: read("ROADSIDE_GOOGLE_MAPS_BASE_URL")
                .unwrap_or_else(|| MapsConfig::DEFAULT_BASE_URL.to_string()),
            timeout: seconds(
                "ROADSIDE_LOOKUP_TIMEOUT_SECONDS",
                DEFAULT_LOOKUP_TIMEOUT_SECONDS,
            ),
        };

        let allowed_origins = read("ROADSIDE_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        Self {
            bind: read("ROADSIDE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            classifier,
            maps,
            allowed_origins,
            max_body_bytes: read("ROADSIDE_MAX_BODY_BYTES")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }
}
