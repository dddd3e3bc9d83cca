//! Response snapshots

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// The parsed body or the captured failure of one call to one target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSnapshot {
    Parsed(Value),
    Error(String),
}

impl ResponseSnapshot {
    /// Error marker carrying a description
    pub fn error(description: impl fmt::Display) -> Self {
        ResponseSnapshot::Error(description.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseSnapshot::Error(_))
    }

    /// The tree compared against the other target.
    ///
    /// Errors render as `{"error": "<description>"}`, so a one-sided
    /// failure shows up as a difference.
    pub fn to_tree(&self) -> Value {
        match self {
            ResponseSnapshot::Parsed(value) => value.clone(),
            ResponseSnapshot::Error(description) => json!({ "error": description }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tree() {
        let snapshot = ResponseSnapshot::error("connection refused");
        assert!(snapshot.is_error());
        assert_eq!(snapshot.to_tree(), json!({"error": "connection refused"}));
    }

    #[test]
    fn test_parsed_tree() {
        let snapshot = ResponseSnapshot::Parsed(json!([1, 2]));
        assert!(!snapshot.is_error());
        assert_eq!(snapshot.to_tree(), json!([1, 2]));
    }
}
