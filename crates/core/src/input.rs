use serde_json::{json, Value};

use crate::error::ValidationError;

pub const PLACES_ENVELOPE_TYPE: &str = "google_places_api_response";
pub const USER_SELECTION_TYPE: &str = "user_selected_place";

/// Entry shape of a resolution request.
///
/// The resolver always forwards the caller's original `data` to the
/// classifier; this enum only decides which path the request may take.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Free text as spoken or typed by the caller.
    Text(String),
    /// A place picked from a previously offered candidate list.
    Selection(String),
    /// A places provider reply being replayed for interpretation.
    PlacesEnvelope(Value),
    /// An address that was already resolved upstream.
    ResolvedAddress(Value),
    /// Any other non-empty JSON payload.
    Other(Value),
}

impl LocationInput {
    pub fn from_data(data: Option<&Value>) -> Result<Self, ValidationError> {
        let data = match data {
            None | Some(Value::Null) => return Err(ValidationError::MissingData),
            Some(value) => value,
        };

        match data {
            Value::String(text) => {
                let text = normalize_text(text);
                if text.is_empty() {
                    Err(ValidationError::EmptyData)
                } else {
                    Ok(Self::Text(text))
                }
            }
            Value::Object(map) if map.is_empty() => Err(ValidationError::EmptyData),
            Value::Array(items) if items.is_empty() => Err(ValidationError::EmptyData),
            Value::Object(map) => match map.get("type").and_then(Value::as_str) {
                Some(USER_SELECTION_TYPE) => {
                    let selected = map
                        .get("selected")
                        .and_then(Value::as_str)
                        .map(normalize_text)
                        .filter(|value| !value.is_empty())
                        .ok_or(ValidationError::BlankField { field: "selected" })?;
                    Ok(Self::Selection(selected))
                }
                Some(PLACES_ENVELOPE_TYPE) => Ok(Self::PlacesEnvelope(data.clone())),
                _ if map.get("is_full_address").and_then(Value::as_bool) == Some(true) => {
                    Ok(Self::ResolvedAddress(data.clone()))
                }
                _ => match map.get("text") {
                    Some(Value::String(text)) => {
                        let text = normalize_text(text);
                        if text.is_empty() {
                            Err(ValidationError::BlankField { field: "text" })
                        } else {
                            Ok(Self::Text(text))
                        }
                    }
                    _ => Ok(Self::Other(data.clone())),
                },
            },
            other => Ok(Self::Other(other.clone())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Selection(_) => "selection",
            Self::PlacesEnvelope(_) => "places_envelope",
            Self::ResolvedAddress(_) => "resolved_address",
            Self::Other(_) => "other",
        }
    }
}

/// Wraps a raw places provider payload for the second classifier round.
pub fn places_envelope(raw: Value) -> Value {
    json!({
        "type": PLACES_ENVELOPE_TYPE,
        "raw": raw,
    })
}

pub fn selection_envelope(selected: &str) -> Value {
    json!({
        "type": USER_SELECTION_TYPE,
        "selected": selected,
    })
}

pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
