//! YAML loading for parity runs
//!
//! This crate loads the two file inputs of a run:
//!
//! - the run configuration, a YAML document that may use these tags:
//!   - `!include path` - Include another YAML file
//!   - `!secret key` - Substitute from secrets.yaml (token prefixes live there)
//!   - `!env_var VAR` - Environment variable substitution
//! - the case catalogue, a [`Workbook`] of named sheets of rows
//!
//! # Example
//!
//! ```ignore
//! use parity_config::{load_yaml_as, Workbook};
//!
//! let settings: MySettings = load_yaml_as("/etc/parity", "parity.yaml")?;
//! let workbook = Workbook::load("/etc/parity/cases.yaml")?;
//! let endpoint_rows = workbook.rows("endpoints")?;
//! ```

mod error;
mod loader;
mod secrets;
mod workbook;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_as, YamlLoader};
pub use secrets::Secrets;
pub use workbook::Workbook;

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;

/// Text of a scalar YAML value; `None` for null, empty strings and collections
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Tagged(tagged) => return scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
