//! Error types for dispatch and reporting

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of one call to one target. Never escapes the dispatcher: it is
/// turned into an error snapshot.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported request method: {method}")]
    UnsupportedMethod { method: String },

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("response body is not JSON (HTTP {status}): {reason}")]
    InvalidBody { status: u16, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for reporter operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Failure to record a case result
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize attachment '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
