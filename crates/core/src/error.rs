//! Error types for location resolution and the outbound gateways.
//!
//! Each gateway has its own error enum so callers can tell a classifier
//! failure from a lookup failure. `ResolutionError` is what the resolver and
//! the HTTP layer deal in.

use thiserror::Error;

/// Rejected request input. Always raised before any upstream call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body is missing `data`")]
    MissingData,

    #[error("`data` must not be empty")]
    EmptyData,

    #[error("`{field}` must be a non-empty string")]
    BlankField { field: &'static str },
}

/// Failure talking to the language-model classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier is not configured: missing API key")]
    NotConfigured,

    #[error("classifier request timed out")]
    Timeout,

    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier reply carried no message content")]
    MissingContent,

    #[error("classifier reply is not a JSON object: {0}")]
    InvalidJson(String),
}

/// Failure talking to the places search provider.
///
/// A search that matches nothing is not an error; see `PlacesOutcome::NoResults`.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("places lookup is not configured: missing API key")]
    NotConfigured,

    #[error("places lookup query is empty")]
    EmptyQuery,

    #[error("places lookup timed out")]
    Timeout,

    #[error("places lookup request failed: {0}")]
    Transport(String),

    #[error("places provider returned status {status}{}", format_provider_message(.message))]
    Provider {
        status: String,
        message: Option<String>,
    },

    #[error("places provider response could not be read: {0}")]
    InvalidResponse(String),
}

/// Failure talking to the distance matrix provider.
#[derive(Error, Debug)]
pub enum DistanceError {
    #[error("distance lookup is not configured: missing API key")]
    NotConfigured,

    #[error("distance lookup timed out")]
    Timeout,

    #[error("distance lookup request failed: {0}")]
    Transport(String),

    #[error("distance provider returned status {status}{}", format_provider_message(.message))]
    Provider {
        status: String,
        message: Option<String>,
    },

    #[error("distance provider response could not be read: {0}")]
    InvalidResponse(String),
}

/// Everything that can end a resolution request without a result.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("location resolution failed: {0}")]
    Orchestrator(String),
}

impl ResolutionError {
    pub fn orchestrator<S: Into<String>>(message: S) -> Self {
        Self::Orchestrator(message.into())
    }

    /// HTTP status the request should be answered with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Stable name of the error kind, used in logs and error envelopes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Classifier(_) => "ClassifierError",
            Self::Lookup(_) => "LookupError",
            Self::Orchestrator(_) => "OrchestratorError",
        }
    }

    /// Top-level message for the error envelope.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => format!("Invalid request: {err}"),
            _ => "Location processing error".to_string(),
        }
    }
}

fn format_provider_message(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => format!(": {message}"),
        _ => String::new(),
    }
}
