//! Case catalogue workbook
//!
//! A workbook is a YAML mapping of sheet name to rows; every row is a
//! sequence of cells and the first row of each sheet is a header:
//!
//! ```yaml
//! endpoints:
//!   - [name, method, headers, path, common, primary, secondary, ignore]
//!   - [user list, GET, "", /v1/users, '{"page": 1}', "", "", meta.updatedAt]
//! accounts:
//!   - [account_id]
//!   - [492]
//! ```
//!
//! Scalar cells become text (`492` reads as `"492"`). A cell written as a
//! YAML mapping or sequence is converted to its JSON text, so parameter
//! columns may use either form.

use crate::error::{ConfigError, ConfigResult};
use crate::scalar_text;
use parity_core::Row;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Named sheets of tabular rows
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
    sheets: BTreeMap<String, Vec<Row>>,
}

impl Workbook {
    /// Load a workbook file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse workbook text; `source` is only used in error messages
    pub fn parse(content: &str, source: &Path) -> ConfigResult<Self> {
        let root: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source.to_path_buf(),
            source: e,
        })?;

        let Value::Mapping(map) = root else {
            return Err(ConfigError::InvalidValue {
                key: source.display().to_string(),
                reason: "workbook must be a mapping of sheet name to rows".to_string(),
            });
        };

        let mut sheets = BTreeMap::new();
        for (name, rows) in map {
            let name = scalar_text(&name).ok_or_else(|| ConfigError::InvalidValue {
                key: source.display().to_string(),
                reason: "sheet names must be scalars".to_string(),
            })?;
            let rows = parse_sheet(&name, rows)?;
            debug!("Loaded sheet '{}' with {} rows", name, rows.len());
            sheets.insert(name, rows);
        }

        Ok(Self {
            path: source.to_path_buf(),
            sheets,
        })
    }

    /// Data rows of `sheet`, header row excluded
    pub fn rows(&self, sheet: &str) -> ConfigResult<&[Row]> {
        let rows = self
            .sheets
            .get(sheet)
            .ok_or_else(|| ConfigError::SheetNotFound {
                sheet: sheet.to_string(),
                path: self.path.clone(),
            })?;
        Ok(rows.get(1..).unwrap_or_default())
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_sheet(name: &str, rows: Value) -> ConfigResult<Vec<Row>> {
    let rows = match rows {
        Value::Sequence(rows) => rows,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(ConfigError::InvalidValue {
                key: name.to_string(),
                reason: "sheet must be a sequence of rows".to_string(),
            })
        }
    };

    rows.into_iter()
        .map(|row| match row {
            Value::Sequence(cells) => Ok(cells.iter().map(cell_text).collect()),
            Value::Null => Ok(Vec::new()),
            Value::Mapping(_) => Err(ConfigError::InvalidValue {
                key: name.to_string(),
                reason: "rows must be sequences of cells".to_string(),
            }),
            // A bare scalar is a one-cell row
            scalar => Ok(vec![cell_text(&scalar)]),
        })
        .collect()
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::Mapping(_) | Value::Sequence(_) => match serde_json::to_string(cell) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Cell cannot be represented as JSON, treating as empty: {}", e);
                None
            }
        },
        other => scalar_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOGUE: &str = r#"
endpoints:
  - [name, method, headers, path, common, primary, secondary, ignore]
  - [user list, get, "", /v1/users, '{"page": 1}', "", "", "meta.updatedAt, results.*.createdAt"]
  - ["", GET, "", /skipped]
  - [detail, POST, {Accept: application/json}, /v1/detail, null, {id: 1}, [1, 2]]
accounts:
  - [account_id]
  - [492]
  - ["  17  "]
  - null
  - 8
"#;

    fn workbook() -> Workbook {
        Workbook::parse(CATALOGUE, Path::new("cases.yaml")).unwrap()
    }

    #[test]
    fn test_header_row_skipped() {
        let wb = workbook();
        let rows = wb.rows("endpoints").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].as_deref(), Some("user list"));
    }

    #[test]
    fn test_cells_become_text() {
        let wb = workbook();
        let rows = wb.rows("accounts").unwrap();
        assert_eq!(rows[0], vec![Some("492".to_string())]);
        assert_eq!(rows[1], vec![Some("17".to_string())]);
        assert!(rows[2].is_empty());
        assert_eq!(rows[3], vec![Some("8".to_string())]);
    }

    #[test]
    fn test_structured_cells_become_json() {
        let wb = workbook();
        let detail = &wb.rows("endpoints").unwrap()[2];
        assert_eq!(detail[2].as_deref(), Some(r#"{"Accept":"application/json"}"#));
        assert_eq!(detail[4], None);
        assert_eq!(detail[5].as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(detail[6].as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_rows_feed_core_types() {
        let wb = workbook();
        let endpoints = parity_core::EndpointDefinition::from_rows(wb.rows("endpoints").unwrap());
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].ignore_fields.len(), 2);
        assert_eq!(endpoints[1].method, parity_core::Method::Post);
        // `[1, 2]` is not a mapping
        assert_eq!(endpoints[1].parse_warnings().len(), 1);

        let accounts = parity_core::AccountSelection::all()
            .resolve(wb.rows("accounts").unwrap())
            .unwrap();
        assert_eq!(accounts.len(), 3);
    }

    #[test]
    fn test_missing_sheet() {
        let wb = workbook();
        assert!(matches!(
            wb.rows("interfaces"),
            Err(ConfigError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_header_only_sheet() {
        let wb = Workbook::parse("accounts:\n  - [account_id]\n", Path::new("x.yaml")).unwrap();
        assert!(wb.rows("accounts").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(Workbook::parse("- a\n- b\n", Path::new("x.yaml")).is_err());
        assert!(Workbook::parse("accounts: 3\n", Path::new("x.yaml")).is_err());
        assert!(Workbook::parse("accounts:\n  - {a: 1}\n", Path::new("x.yaml")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cases.yaml");
        fs::write(&path, CATALOGUE).unwrap();

        let wb = Workbook::load(&path).unwrap();
        assert_eq!(wb.path(), path.as_path());
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["accounts", "endpoints"]);
    }
}
