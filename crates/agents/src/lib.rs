use std::sync::Arc;
use std::time::Instant;

use roadside_core::{
    places_envelope, CandidateList, Classification, LocationInput, PlacesOutcome,
    ResolutionError, ResolutionResult, ValidationError,
};
use roadside_gateways::{Classifier, PlacesLookup};
use roadside_observability::AppMetrics;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Turns caller input into a search-ready address or a candidate list.
///
/// Each call issues at most three upstream requests, strictly in order:
/// classify, search, classify. Nothing is kept between calls.
#[derive(Clone)]
pub struct LocationResolver<C, L>
where
    C: Classifier,
    L: PlacesLookup,
{
    classifier: Arc<C>,
    places: Arc<L>,
    metrics: Arc<AppMetrics>,
    default_locality: String,
}

impl<C, L> LocationResolver<C, L>
where
    C: Classifier,
    L: PlacesLookup,
{
    pub fn new(
        classifier: Arc<C>,
        places: Arc<L>,
        metrics: Arc<AppMetrics>,
        default_locality: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            places,
            metrics,
            default_locality: default_locality.into(),
        }
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Resolves the `data` field of one request.
    #[instrument(skip(self, data), fields(resolution_id = %Uuid::new_v4()))]
    pub async fn resolve(&self, data: Option<&Value>) -> Result<ResolutionResult, ResolutionError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let outcome = self.run(data).await;

        self.metrics.observe_latency(started.elapsed());
        match &outcome {
            Ok(result) => {
                self.metrics.record_terminal(result.terminal());
                info!(
                    terminal = result.terminal(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "location resolved"
                );
            }
            Err(err) => {
                self.metrics.inc_failure();
                warn!(kind = err.kind(), error = %err, "location resolution failed");
            }
        }
        outcome
    }

    async fn run(&self, data: Option<&Value>) -> Result<ResolutionResult, ResolutionError> {
        let Some(data) = data else {
            return Err(ValidationError::MissingData.into());
        };
        let input = LocationInput::from_data(Some(data))?;
        debug!(input = input.kind(), "classifying input");

        let reply = self.classify(data).await?;
        let classification = Classification::parse(&reply);
        debug!(classification = classification.label(), "first classification");

        if let Classification::FullAddress(map) = classification {
            return Ok(ResolutionResult::FullAddress(map));
        }
        if let LocationInput::Selection(selected) = &input {
            return Ok(self.resolve_selection_locally(selected));
        }

        match classification {
            Classification::NeedsSearch(query) => self.search_and_reclassify(&query).await,
            _ => Ok(ResolutionResult::Passthrough(reply)),
        }
    }

    async fn search_and_reclassify(
        &self,
        query: &str,
    ) -> Result<ResolutionResult, ResolutionError> {
        self.metrics.inc_lookup_call();
        let outcome = self.places.search(query).await?;

        let closed = outcome.closed_names();
        let raw = match outcome {
            PlacesOutcome::NoResults => {
                info!(query, "places search found nothing");
                return Ok(ResolutionResult::NoResults);
            }
            PlacesOutcome::Found(entries) => Value::Array(entries),
        };

        let reply = self.classify(&places_envelope(raw)).await?;
        let classification = Classification::parse_candidates(&reply);
        debug!(classification = classification.label(), "second classification");

        Ok(match classification {
            Classification::FullAddress(map) => ResolutionResult::FullAddress(map),
            Classification::Options(values) => {
                ResolutionResult::Options(CandidateList::from_values(&values, &closed))
            }
            Classification::NoResults => ResolutionResult::NoResults,
            Classification::NeedsSearch(_) | Classification::Unrecognized => {
                ResolutionResult::Passthrough(reply)
            }
        })
    }

    async fn classify(&self, payload: &Value) -> Result<Value, ResolutionError> {
        self.metrics.inc_classifier_call();
        Ok(self.classifier.classify(payload).await?)
    }

    // A selection never goes to search; if the model drifted, append the
    // default locality ourselves.
    fn resolve_selection_locally(&self, selected: &str) -> ResolutionResult {
        warn!(selected = %selected, "classifier did not resolve selection; using default locality");

        let mut map = Map::new();
        map.insert("is_full_address".to_string(), Value::Bool(true));
        map.insert(
            "clean_query_text".to_string(),
            Value::String(format!("{} {}", selected, self.default_locality)),
        );
        ResolutionResult::FullAddress(map)
    }
}
