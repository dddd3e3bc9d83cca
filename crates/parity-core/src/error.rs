//! Error types for parity runs

use thiserror::Error;

/// Result type for core operations
pub type ParityResult<T> = Result<T, ParityError>;

/// Errors raised while building the case list
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParityError {
    /// The run cannot proceed (no accounts, missing required input)
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A catalogue cell held malformed JSON. Recovered locally: the field
    /// falls back to an empty mapping and this value is kept as a warning.
    #[error("endpoint '{endpoint}': could not parse {field}: {reason}")]
    ParamParse {
        endpoint: String,
        field: &'static str,
        reason: String,
    },

    /// Method outside GET/POST/PUT/DELETE
    #[error("unsupported request method: {method}")]
    UnsupportedMethod { method: String },
}

impl ParityError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
