//! Endpoint definitions parsed from the case catalogue

use crate::error::ParityError;
use crate::{cell, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Request parameters (a JSON object)
pub type Params = Map<String, Value>;

/// Column positions of the endpoint sheet
pub mod columns {
    pub const NAME: usize = 0;
    pub const METHOD: usize = 1;
    pub const BASE_HEADERS: usize = 2;
    pub const PATH: usize = 3;
    pub const COMMON_PARAMS: usize = 4;
    pub const PRIMARY_PARAMS: usize = 5;
    pub const SECONDARY_PARAMS: usize = 6;
    pub const IGNORE_FIELDS: usize = 7;
}

/// HTTP method of an endpoint
///
/// Unknown methods are kept as [`Method::Other`] so the dispatcher can turn
/// them into an error snapshot instead of dropping the row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    /// Parse a method name, case-insensitively. Blank text means GET.
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "" | "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            _ => Method::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Other(m) => m,
        }
    }

    /// Whether the dispatcher can issue this method
    pub fn is_supported(&self) -> bool {
        !matches!(self, Method::Other(_))
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        Method::parse(&s)
    }
}

impl From<Method> for String {
    fn from(m: Method) -> String {
        m.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free-form JSON cell of the catalogue, parsed but not yet trusted
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParamCell {
    /// The cell was empty
    #[default]
    Absent,
    /// The cell held a JSON object
    Parsed(Params),
    /// The cell held text that is not a JSON object
    Failed(String),
}

impl ParamCell {
    /// Parse optional cell text
    pub fn parse(text: Option<&str>) -> Self {
        match text {
            None => ParamCell::Absent,
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => Self::from_value(value),
                Err(e) => ParamCell::Failed(e.to_string()),
            },
        }
    }

    /// Wrap an already parsed value
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => ParamCell::Parsed(map),
            Value::Null => ParamCell::Absent,
            other => ParamCell::Failed(format!("expected a JSON object, found {}", other)),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ParamCell::Failed(_))
    }

    /// The mapping to use, with `Failed` degraded to empty
    pub fn params(&self) -> Params {
        match self {
            ParamCell::Parsed(map) => map.clone(),
            ParamCell::Absent | ParamCell::Failed(_) => Params::new(),
        }
    }

    fn failure(&self) -> Option<&str> {
        match self {
            ParamCell::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// One endpoint of the catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    pub name: String,
    pub method: Method,
    pub base_headers: ParamCell,
    /// URL path, appended verbatim to each target's base URL
    pub path: String,
    /// When non-empty, sent to both targets instead of the per-target sets
    pub common_params: ParamCell,
    pub primary_params: ParamCell,
    pub secondary_params: ParamCell,
    /// Dotted field paths excluded before comparison
    pub ignore_fields: Vec<String>,
}

impl EndpointDefinition {
    /// Create a GET definition with no parameters
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: Method::Get,
            base_headers: ParamCell::Absent,
            path: path.into(),
            common_params: ParamCell::Absent,
            primary_params: ParamCell::Absent,
            secondary_params: ParamCell::Absent,
            ignore_fields: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_headers(mut self, headers: Value) -> Self {
        self.base_headers = ParamCell::from_value(headers);
        self
    }

    pub fn with_common_params(mut self, params: Value) -> Self {
        self.common_params = ParamCell::from_value(params);
        self
    }

    pub fn with_target_params(mut self, primary: Value, secondary: Value) -> Self {
        self.primary_params = ParamCell::from_value(primary);
        self.secondary_params = ParamCell::from_value(secondary);
        self
    }

    pub fn ignore_field(mut self, path: &str) -> Self {
        self.ignore_fields.push(path.to_string());
        self
    }

    /// Build a definition from one catalogue row.
    ///
    /// Returns `None` for rows without a name. Malformed JSON cells never
    /// reject the row; they are kept as [`ParamCell::Failed`].
    pub fn from_row(row: &Row) -> Option<Self> {
        let name = cell(row, columns::NAME)?.to_string();

        let ignore_fields = cell(row, columns::IGNORE_FIELDS)
            .map(|text| {
                text.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            name,
            method: cell(row, columns::METHOD)
                .map(Method::parse)
                .unwrap_or_default(),
            base_headers: ParamCell::parse(cell(row, columns::BASE_HEADERS)),
            path: cell(row, columns::PATH).unwrap_or_default().to_string(),
            common_params: ParamCell::parse(cell(row, columns::COMMON_PARAMS)),
            primary_params: ParamCell::parse(cell(row, columns::PRIMARY_PARAMS)),
            secondary_params: ParamCell::parse(cell(row, columns::SECONDARY_PARAMS)),
            ignore_fields,
        })
    }

    /// Parse every row of the endpoint sheet (header already skipped)
    pub fn from_rows(rows: &[Row]) -> Vec<Self> {
        rows.iter().filter_map(Self::from_row).collect()
    }

    /// One [`ParityError::ParamParse`] per malformed JSON cell
    pub fn parse_warnings(&self) -> Vec<ParityError> {
        [
            ("request headers", &self.base_headers),
            ("common params", &self.common_params),
            ("primary params", &self.primary_params),
            ("secondary params", &self.secondary_params),
        ]
        .into_iter()
        .filter_map(|(field, cell)| {
            cell.failure().map(|reason| ParityError::ParamParse {
                endpoint: self.name.clone(),
                field,
                reason: reason.to_string(),
            })
        })
        .collect()
    }

    /// Base headers as strings; non-string JSON values keep their JSON text
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.base_headers
            .params()
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect()
    }

    /// The (primary, secondary) parameter pair.
    ///
    /// Non-empty common params supersede both per-target sets.
    pub fn effective_params(&self) -> (Params, Params) {
        let common = self.common_params.params();
        if !common.is_empty() {
            (common.clone(), common)
        } else {
            (self.primary_params.params(), self.secondary_params.params())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: &[&str]) -> Row {
        cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect()
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse(" Post "), Method::Post);
        assert_eq!(Method::parse(""), Method::Get);
        assert_eq!(Method::parse("patch"), Method::Other("PATCH".into()));
        assert!(!Method::parse("patch").is_supported());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_from_full_row() {
        let def = EndpointDefinition::from_row(&row(&[
            "user list",
            "post",
            r#"{"Accept": "application/json", "X-Version": 2}"#,
            "/v1/users",
            "",
            r#"{"page": 1}"#,
            r#"{"pageNo": 1}"#,
            "meta.updatedAt, results.*.createdAt,,",
        ]))
        .unwrap();

        assert_eq!(def.name, "user list");
        assert_eq!(def.method, Method::Post);
        assert_eq!(def.path, "/v1/users");
        assert_eq!(def.ignore_fields, vec!["meta.updatedAt", "results.*.createdAt"]);
        assert_eq!(def.headers().get("X-Version").map(String::as_str), Some("2"));

        let (primary, secondary) = def.effective_params();
        assert_eq!(Value::Object(primary), json!({"page": 1}));
        assert_eq!(Value::Object(secondary), json!({"pageNo": 1}));
        assert!(def.parse_warnings().is_empty());
    }

    #[test]
    fn test_short_row_defaults() {
        let def = EndpointDefinition::from_row(&row(&["ping"])).unwrap();
        assert_eq!(def.method, Method::Get);
        assert_eq!(def.path, "");
        assert!(def.ignore_fields.is_empty());
        assert!(def.headers().is_empty());
    }

    #[test]
    fn test_nameless_row_is_skipped() {
        assert!(EndpointDefinition::from_row(&row(&["", "GET", "", "/x"])).is_none());
        let defs = EndpointDefinition::from_rows(&[row(&["a"]), row(&[]), row(&["b"])]);
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn test_common_params_supersede() {
        let def = EndpointDefinition::new("x", "/v1/x")
            .with_common_params(json!({"id": 1}))
            .with_target_params(json!({"a": 1}), json!({"b": 2}));
        let (primary, secondary) = def.effective_params();
        assert_eq!(Value::Object(primary), json!({"id": 1}));
        assert_eq!(Value::Object(secondary), json!({"id": 1}));
    }

    #[test]
    fn test_empty_common_params_fall_through() {
        let def = EndpointDefinition::new("x", "/v1/x")
            .with_common_params(json!({}))
            .with_target_params(json!({"a": 1}), json!({}));
        let (primary, secondary) = def.effective_params();
        assert_eq!(Value::Object(primary), json!({"a": 1}));
        assert!(secondary.is_empty());
    }

    #[test]
    fn test_malformed_cells_degrade_to_empty() {
        let def = EndpointDefinition::from_row(&row(&[
            "broken",
            "GET",
            "{not json",
            "/v1/broken",
            "[1, 2]",
            r#"{"ok": true}"#,
            "{",
        ]))
        .unwrap();

        assert!(def.headers().is_empty());
        let (primary, secondary) = def.effective_params();
        assert_eq!(Value::Object(primary), json!({"ok": true}));
        assert!(secondary.is_empty());

        let warnings = def.parse_warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| matches!(
            w,
            ParityError::ParamParse { endpoint, .. } if endpoint == "broken"
        )));
    }
}
