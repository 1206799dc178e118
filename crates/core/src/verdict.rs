use serde_json::{Map, Value};

/// Runtime-validated reading of a classifier reply.
///
/// The model's output is only loosely bound to the instruction contract, so
/// the resolver never trusts field presence directly and branches on this
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// `is_full_address: true`; the reply object is kept as returned.
    FullAddress(Map<String, Value>),
    /// `is_full_address: false` with a usable `search_query`, trimmed but
    /// otherwise as the model wrote it.
    NeedsSearch(String),
    /// A candidate list, read from `landmarks`, else `options`, else empty
    /// when only `ask_user_options: true` is present.
    Options(Vec<Value>),
    /// `no_results_found: true`.
    NoResults,
    /// Anything else.
    Unrecognized,
}

impl Classification {
    /// Reads a reply to raw caller input or a selection.
    pub fn parse(reply: &Value) -> Self {
        let Some(map) = reply.as_object() else {
            return Self::Unrecognized;
        };

        match map.get("is_full_address").and_then(Value::as_bool) {
            Some(true) => return Self::FullAddress(map.clone()),
            Some(false) => {
                let query = map
                    .get("search_query")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                if !query.is_empty() {
                    return Self::NeedsSearch(query.to_string());
                }
            }
            None => {}
        }

        Self::terminal(map)
    }

    /// Reads a reply to a places envelope. A second search is never issued,
    /// so a leftover `search_query` is ignored and candidate fields win.
    pub fn parse_candidates(reply: &Value) -> Self {
        let Some(map) = reply.as_object() else {
            return Self::Unrecognized;
        };

        if map.get("is_full_address").and_then(Value::as_bool) == Some(true) {
            return Self::FullAddress(map.clone());
        }
        Self::terminal(map)
    }

    fn terminal(map: &Map<String, Value>) -> Self {
        if flag(map, "no_results_found") {
            return Self::NoResults;
        }

        if let Some(landmarks) = map.get("landmarks").and_then(Value::as_array) {
            return Self::Options(landmarks.clone());
        }
        if let Some(options) = map.get("options").and_then(Value::as_array) {
            return Self::Options(options.clone());
        }
        if flag(map, "ask_user_options") {
            return Self::Options(Vec::new());
        }

        Self::Unrecognized
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullAddress(_) => "full_address",
            Self::NeedsSearch(_) => "needs_search",
            Self::Options(_) => "options",
            Self::NoResults => "no_results",
            Self::Unrecognized => "unrecognized",
        }
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}
