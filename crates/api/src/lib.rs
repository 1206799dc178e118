mod config;
mod response;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use roadside_agents::LocationResolver;
use roadside_core::{DistanceEstimate, ResolutionResult};
use roadside_gateways::{
    DistanceGateway, GoogleDistanceMatrix, GooglePlacesLookup, OpenAiClassifier,
};
use roadside_observability::AppMetrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::ServiceConfig;
pub use response::{ApiError, ApiResponse};

pub type Resolver = LocationResolver<OpenAiClassifier, GooglePlacesLookup>;

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<Resolver>,
    pub distance: Arc<GoogleDistanceMatrix>,
    pub metrics: Arc<AppMetrics>,
    pub capabilities: HealthCapabilities,
    pub allowed_origins: Arc<Vec<String>>,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthCapabilities {
    classifier: bool,
    places_lookup: bool,
    distance: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: roadside_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Deserialize)]
struct ProcessLocationRequest {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DistanceRequest {
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    destination: Option<String>,
}

pub async fn build_app(config: ServiceConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let classifier = Arc::new(
        OpenAiClassifier::new(config.classifier.clone())
            .context("failed to initialize classifier gateway")?,
    );
    let places = Arc::new(
        GooglePlacesLookup::new(config.maps.clone())
            .context("failed to initialize places gateway")?,
    );
    let distance = Arc::new(
        GoogleDistanceMatrix::new(config.maps.clone())
            .context("failed to initialize distance gateway")?,
    );

    let capabilities = HealthCapabilities {
        classifier: classifier.is_configured(),
        places_lookup: places.is_configured(),
        distance: places.is_configured(),
    };
    if !capabilities.classifier {
        tracing::warn!("ROADSIDE_OPENAI_API_KEY is not set; location requests will fail");
    }
    if !capabilities.places_lookup {
        tracing::warn!("ROADSIDE_GOOGLE_MAPS_API_KEY is not set; place searches will fail");
    }

    let resolver = Arc::new(LocationResolver::new(
        classifier,
        places,
        metrics.clone(),
        config.classifier.default_locality.clone(),
    ));

    let state = ApiState {
        resolver,
        distance,
        metrics,
        capabilities,
        allowed_origins: Arc::new(config.allowed_origins),
        max_body_bytes: config.max_body_bytes,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/location/process", post(process_location))
        .route("/api/distance", post(distance_lookup))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(state.max_body_bytes))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: state.capabilities,
    })
}

async fn process_location(
    State(state): State<ApiState>,
    payload: Result<Json<ProcessLocationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ResolutionResult>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let result = state.resolver.resolve(request.data.as_ref()).await?;
    let message = match &result {
        ResolutionResult::FullAddress(_) => "Location resolved",
        ResolutionResult::Options(_) => "Please choose one of the nearby places",
        ResolutionResult::NoResults => "No matching places found",
        ResolutionResult::Passthrough(_) => "Location processed",
    };
    Ok(ApiResponse::ok(result, message))
}

async fn distance_lookup(
    State(state): State<ApiState>,
    payload: Result<Json<DistanceRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DistanceEstimate>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let origin = required_field(request.origin, "origin")?;
    let destination = required_field(request.destination, "destination")?;

    state.metrics.inc_distance_call();
    let estimate = state
        .distance
        .distance(&origin, &destination)
        .await
        .map_err(|err| {
            state.metrics.inc_failure();
            tracing::warn!(error = %err, "distance lookup failed");
            ApiError::from(err)
        })?;

    Ok(ApiResponse::ok(estimate, "Distance calculated"))
}

fn required_field(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("`{field}` must be a non-empty string")))
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5173")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
