use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::Client;
use roadside_core::{classifier_instruction, ClassifierError, DEFAULT_LOCALITY};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::{build_http_client, Classifier};

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub default_locality: String,
    pub timeout: Duration,
}

impl ClassifierConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            default_locality: DEFAULT_LOCALITY.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Chat-completions backed classifier.
pub struct OpenAiClassifier {
    client: Client,
    config: ClassifierConfig,
    instruction: String,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = build_http_client(config.timeout)?;
        let instruction = classifier_instruction(&config.default_locality);
        Ok(Self {
            client,
            config,
            instruction,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn request_body(&self, payload: &Value) -> Value {
        json!({
            "model": self.config.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.instruction },
                { "role": "user", "content": payload.to_string() }
            ]
        })
    }
}

impl Classifier for OpenAiClassifier {
    #[instrument(skip(self, payload), fields(model = %self.config.model))]
    async fn classify(&self, payload: &Value) -> Result<Value, ClassifierError> {
        let api_key = self.api_key().ok_or(ClassifierError::NotConfigured)?;
        let started = Instant::now();

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&self.request_body(payload))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "classifier returned non-success status");
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(|err| {
            if err.is_timeout() {
                ClassifierError::Timeout
            } else {
                ClassifierError::InvalidJson(err.to_string())
            }
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ClassifierError::MissingContent)?;

        let reply = parse_reply(&content)?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "classifier replied"
        );
        Ok(reply)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_reply(content: &str) -> Result<Value, ClassifierError> {
    let text = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(text).map_err(|err| ClassifierError::InvalidJson(err.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ClassifierError::InvalidJson(format!(
            "expected an object, got {value}"
        )))
    }
}

// JSON mode normally returns bare JSON; some models still wrap it in a fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn transport_error(err: reqwest::Error) -> ClassifierError {
    if err.is_timeout() {
        ClassifierError::Timeout
    } else {
        ClassifierError::Transport(err.to_string())
    }
}
