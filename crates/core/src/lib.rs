pub mod error;
pub mod input;
pub mod models;
pub mod prompt;
pub mod verdict;

pub use error::{ClassifierError, DistanceError, LookupError, ResolutionError, ValidationError};
pub use input::{
    normalize_text, places_envelope, selection_envelope, LocationInput, PLACES_ENVELOPE_TYPE,
    USER_SELECTION_TYPE,
};
pub use models::*;
pub use prompt::{classifier_instruction, DEFAULT_LOCALITY};
pub use verdict::Classification;
