//! Structural comparison of response trees
//!
//! Mappings are compared key by key. Sequences are compared as multisets:
//! element order is ignored but multiplicity is not. Scalars compare by
//! value and JSON type, so `1` and `"1"` differ (and so do `1` and `1.0`).
//!
//! Sequence elements are matched through a canonical text form in which
//! mapping keys are sorted and nested sequences are sorted by their own
//! canonical form. Two elements match exactly when their canonical forms
//! are equal; among equal elements the lowest unmatched index is taken.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

/// Kind of disagreement at one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffCategory {
    /// Key present only in the secondary response
    Added,
    /// Key present only in the primary response
    Removed,
    /// Same type, different value
    Changed,
    /// Different JSON types
    TypeChanged,
    /// Sequence element with no equal counterpart in the primary response
    ItemAdded,
    /// Sequence element with no equal counterpart in the secondary response
    ItemRemoved,
}

impl fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            DiffCategory::Added => "ADDED",
            DiffCategory::Removed => "REMOVED",
            DiffCategory::Changed => "CHANGED",
            DiffCategory::TypeChanged => "TYPE",
            DiffCategory::ItemAdded => "ITEM+",
            DiffCategory::ItemRemoved => "ITEM-",
        })
    }
}

/// A specific difference between two trees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    pub category: DiffCategory,
    /// `a.b[2].c`; the root is `(root)`
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Value>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "(missing)".to_string(),
        };
        write!(
            f,
            "[{:>7}] {} : primary={} secondary={}",
            self.category,
            self.path,
            show(&self.primary),
            show(&self.secondary)
        )
    }
}

/// Every disagreement between two trees; empty means structurally equal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffReport {
    pub differences: Vec<Difference>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Difference> {
        self.differences.iter()
    }

    /// Number of differences of one category
    pub fn count(&self, category: DiffCategory) -> usize {
        self.differences
            .iter()
            .filter(|d| d.category == category)
            .count()
    }

    /// Machine-readable form, grouped by category
    pub fn to_json(&self) -> Value {
        let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for diff in &self.differences {
            let category = match serde_json::to_value(diff.category) {
                Ok(Value::String(s)) => s,
                _ => diff.category.to_string(),
            };
            let mut entry = Map::new();
            entry.insert("path".into(), Value::String(diff.path.clone()));
            if let Some(primary) = &diff.primary {
                entry.insert("primary".into(), primary.clone());
            }
            if let Some(secondary) = &diff.secondary {
                entry.insert("secondary".into(), secondary.clone());
            }
            grouped.entry(category).or_default().push(Value::Object(entry));
        }
        Value::Object(
            grouped
                .into_iter()
                .map(|(k, v)| (k, Value::Array(v)))
                .collect(),
        )
    }
}

/// Compare the primary tree against the secondary tree
pub fn diff(primary: &Value, secondary: &Value) -> DiffReport {
    let mut differences = Vec::new();
    diff_at("", primary, secondary, &mut differences);
    DiffReport { differences }
}

/// Whether two trees are equal with sequence order ignored
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    canonical_key(a) == canonical_key(b)
}

fn diff_at(path: &str, primary: &Value, secondary: &Value, out: &mut Vec<Difference>) {
    match (primary, secondary) {
        (Value::Object(p), Value::Object(s)) => {
            for (key, p_value) in p {
                let child = key_path(path, key);
                match s.get(key) {
                    Some(s_value) => diff_at(&child, p_value, s_value, out),
                    None => out.push(Difference {
                        category: DiffCategory::Removed,
                        path: child,
                        primary: Some(p_value.clone()),
                        secondary: None,
                    }),
                }
            }
            for (key, s_value) in s {
                if !p.contains_key(key) {
                    out.push(Difference {
                        category: DiffCategory::Added,
                        path: key_path(path, key),
                        primary: None,
                        secondary: Some(s_value.clone()),
                    });
                }
            }
        }
        (Value::Array(p), Value::Array(s)) => diff_sequences(path, p, s, out),
        _ if primary == secondary => {}
        _ => out.push(Difference {
            category: if kind(primary) == kind(secondary) {
                DiffCategory::Changed
            } else {
                DiffCategory::TypeChanged
            },
            path: display_path(path),
            primary: Some(primary.clone()),
            secondary: Some(secondary.clone()),
        }),
    }
}

/// Multiset comparison: pair equal elements, report the leftovers
fn diff_sequences(path: &str, primary: &[Value], secondary: &[Value], out: &mut Vec<Difference>) {
    let mut unmatched: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (index, item) in secondary.iter().enumerate() {
        unmatched
            .entry(canonical_key(item))
            .or_default()
            .push_back(index);
    }

    let mut matched = vec![false; secondary.len()];
    for (index, item) in primary.iter().enumerate() {
        let partner = unmatched
            .get_mut(&canonical_key(item))
            .and_then(VecDeque::pop_front);
        match partner {
            Some(j) => matched[j] = true,
            None => out.push(Difference {
                category: DiffCategory::ItemRemoved,
                path: index_path(path, index),
                primary: Some(item.clone()),
                secondary: None,
            }),
        }
    }

    for (index, item) in secondary.iter().enumerate() {
        if !matched[index] {
            out.push(Difference {
                category: DiffCategory::ItemAdded,
                path: index_path(path, index),
                primary: None,
                secondary: Some(item.clone()),
            });
        }
    }
}

/// Canonical text of a tree: sorted keys, sorted sequences
fn canonical_key(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => {
            let mut keyed: Vec<(String, Value)> = items
                .iter()
                .map(|item| {
                    let canonical = canonicalize(item);
                    (canonical.to_string(), canonical)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(keyed.into_iter().map(|(_, v)| v).collect())
        }
        other => other.clone(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", display_path(path), index)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}
