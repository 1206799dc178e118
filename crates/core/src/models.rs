use std::collections::HashSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::input::normalize_text;

/// Ordered, cleaned place names offered to the caller for disambiguation.
///
/// Entries are never empty and never repeated (exact match). Order follows the
/// order the names were pushed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateList(Vec<String>);

impl CandidateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for name in names {
            list.push(name.as_ref());
        }
        list
    }

    /// Builds a list from loosely typed classifier output, skipping anything
    /// that is not a string or names a place in `closed`.
    pub fn from_values(values: &[Value], closed: &HashSet<String>) -> Self {
        let mut list = Self::new();
        for name in values.iter().filter_map(Value::as_str) {
            let cleaned = normalize_text(name);
            if closed.contains(&cleaned) {
                continue;
            }
            list.push(&cleaned);
        }
        list
    }

    /// Returns whether the name was added.
    pub fn push(&mut self, name: &str) -> bool {
        let cleaned = normalize_text(name);
        if cleaned.is_empty() || self.0.iter().any(|existing| *existing == cleaned) {
            return false;
        }
        self.0.push(cleaned);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Terminal outcome of one resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    /// Search-ready address; the classifier's object is kept as returned.
    FullAddress(Map<String, Value>),
    /// The places provider found nothing.
    NoResults,
    /// Candidates the caller must choose from.
    Options(CandidateList),
    /// Classifier reply that matched no known shape, returned unchanged.
    Passthrough(Value),
}

impl ResolutionResult {
    pub fn no_results_sentinel() -> Value {
        json!({
            "no_results_found": true,
            "ask_user_options": false,
        })
    }

    pub fn terminal(&self) -> &'static str {
        match self {
            Self::FullAddress(_) => "address",
            Self::NoResults => "no_results",
            Self::Options(_) => "options",
            Self::Passthrough(_) => "passthrough",
        }
    }

    pub fn clean_query_text(&self) -> Option<&str> {
        match self {
            Self::FullAddress(map) => map.get("clean_query_text").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn landmarks(&self) -> Option<&[String]> {
        match self {
            Self::Options(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::FullAddress(map) => Value::Object(map.clone()),
            Self::NoResults => Self::no_results_sentinel(),
            Self::Options(list) => json!({
                "ask_user_options": true,
                "landmarks": list,
            }),
            Self::Passthrough(value) => value.clone(),
        }
    }
}

impl Serialize for ResolutionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::FullAddress(map) => map.serialize(serializer),
            Self::NoResults => {
                let mut state = serializer.serialize_map(Some(2))?;
                state.serialize_entry("no_results_found", &true)?;
                state.serialize_entry("ask_user_options", &false)?;
                state.end()
            }
            Self::Options(list) => {
                let mut state = serializer.serialize_map(Some(2))?;
                state.serialize_entry("ask_user_options", &true)?;
                state.serialize_entry("landmarks", list)?;
                state.end()
            }
            Self::Passthrough(value) => value.serialize(serializer),
        }
    }
}

/// Result of a places search that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacesOutcome {
    /// Raw provider entries in relevance order.
    Found(Vec<Value>),
    NoResults,
}

impl PlacesOutcome {
    /// Names whose every entry the provider reports as permanently closed.
    ///
    /// A name listed both closed and open (a stale duplicate listing) is not
    /// included.
    pub fn closed_names(&self) -> HashSet<String> {
        let Self::Found(entries) = self else {
            return HashSet::new();
        };

        let mut closed = HashSet::new();
        let mut open = HashSet::new();
        for place in entries
            .iter()
            .filter_map(|entry| PlaceSummary::deserialize(entry).ok())
        {
            let name = normalize_text(&place.name);
            if place.is_permanently_closed() {
                closed.insert(name);
            } else {
                open.insert(name);
            }
        }
        closed.retain(|name| !open.contains(name));
        closed
    }
}

/// The handful of fields read from a raw places entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceSummary {
    pub name: String,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub permanently_closed: Option<bool>,
}

impl PlaceSummary {
    pub fn is_permanently_closed(&self) -> bool {
        self.permanently_closed == Some(true)
            || self.business_status.as_deref() == Some("CLOSED_PERMANENTLY")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEstimate {
    pub origin: String,
    pub destination: String,
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
}
