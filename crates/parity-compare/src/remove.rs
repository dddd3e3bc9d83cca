//! Field-path removal
//!
//! A field path is a dot-separated list of segments such as
//! `results.*.createdAt` or `items.0.id`. Each segment is applied left to
//! right against a working copy of the tree:
//!
//! - `*` descends into every value of a mapping or every element of a sequence
//! - a numeric segment against a sequence selects one element; out of range is a no-op
//! - any other segment against a mapping selects a key; the final segment deletes it
//! - a non-numeric segment against a sequence falls back to [`MismatchPolicy`]
//!
//! Only unsigned digit runs are indices. `-1` does not count from the end of
//! a sequence: it is a key name, so `items.-1.id` leaves the last item alone.
//!
//! Paths that match nothing are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const WILDCARD: &str = "*";

/// What a non-numeric segment does when it meets a sequence.
///
/// Signed segments such as `-1` are non-numeric here and go through this
/// policy rather than indexing from the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Re-apply the same segments to every element
    #[default]
    Broadcast,
    /// Stop at this branch
    Skip,
}

/// Removes ignored fields from response trees
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRemover {
    policy: MismatchPolicy,
}

impl FieldRemover {
    pub fn new(policy: MismatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Return a copy of `tree` with every field reachable by `field_paths` removed
    pub fn remove<S: AsRef<str>>(&self, tree: &Value, field_paths: &[S]) -> Value {
        let mut copy = tree.clone();
        for path in field_paths {
            let segments: Vec<&str> = path.as_ref().split('.').collect();
            self.remove_path(&mut copy, &segments);
        }
        copy
    }

    fn remove_path(&self, node: &mut Value, segments: &[&str]) {
        let Some((&segment, rest)) = segments.split_first() else {
            return;
        };

        if segment == WILDCARD {
            match node {
                Value::Object(map) => {
                    for child in map.values_mut() {
                        self.remove_path(child, rest);
                    }
                }
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        self.remove_path(item, rest);
                    }
                }
                _ => {}
            }
            return;
        }

        match node {
            Value::Array(items) => match parse_index(segment) {
                Some(index) => {
                    if let Some(item) = items.get_mut(index) {
                        self.remove_path(item, rest);
                    }
                }
                None => {
                    if self.policy == MismatchPolicy::Broadcast {
                        for item in items.iter_mut() {
                            self.remove_path(item, segments);
                        }
                    }
                }
            },
            Value::Object(map) => {
                if rest.is_empty() {
                    map.remove(segment);
                } else if let Some(child) = map.get_mut(segment) {
                    self.remove_path(child, rest);
                }
            }
            _ => {}
        }
    }
}

/// Remove fields with the default [`MismatchPolicy::Broadcast`] policy
pub fn remove_fields<S: AsRef<str>>(tree: &Value, field_paths: &[S]) -> Value {
    FieldRemover::default().remove(tree, field_paths)
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wildcard_over_sequence() {
        let tree = json!({"results": [{"createdAt": 1, "v": 1}, {"createdAt": 2, "v": 2}]});
        let out = remove_fields(&tree, &["results.*.createdAt"]);
        assert_eq!(out, json!({"results": [{"v": 1}, {"v": 2}]}));
    }

    #[test]
    fn test_input_is_untouched() {
        let tree = json!({"meta": {"updatedAt": 1, "page": 2}});
        let out = remove_fields(&tree, &["meta.updatedAt"]);
        assert_eq!(out, json!({"meta": {"page": 2}}));
        assert_eq!(tree, json!({"meta": {"updatedAt": 1, "page": 2}}));
    }

    #[test]
    fn test_empty_path_list_is_identity() {
        let tree = json!({"a": [1, {"b": null}]});
        let none: [&str; 0] = [];
        assert_eq!(remove_fields(&tree, &none), tree);
    }

    #[test]
    fn test_wildcard_over_mapping() {
        let tree = json!({"users": {"u1": {"ts": 1, "n": "a"}, "u2": {"ts": 2, "n": "b"}}});
        let out = remove_fields(&tree, &["users.*.ts"]);
        assert_eq!(out, json!({"users": {"u1": {"n": "a"}, "u2": {"n": "b"}}}));
    }

    #[test]
    fn test_wildcard_over_scalar_is_noop() {
        let tree = json!({"a": 5});
        assert_eq!(remove_fields(&tree, &["a.*.b"]), tree);
    }

    #[test]
    fn test_trailing_wildcard_removes_nothing() {
        let tree = json!({"a": {"b": 1}, "c": [1, 2]});
        assert_eq!(remove_fields(&tree, &["a.*", "c.*"]), tree);
    }

    #[test]
    fn test_index_selects_one_element() {
        let tree = json!({"items": [{"id": 1, "x": 1}, {"id": 2, "x": 2}]});
        let out = remove_fields(&tree, &["items.1.id"]);
        assert_eq!(out, json!({"items": [{"id": 1, "x": 1}, {"x": 2}]}));
    }

    #[test]
    fn test_index_out_of_range_is_noop() {
        let tree = json!({"items": [{"id": 1}]});
        assert_eq!(remove_fields(&tree, &["items.5.id"]), tree);
    }

    #[test]
    fn test_trailing_index_removes_nothing() {
        let tree = json!({"items": [1, 2, 3]});
        assert_eq!(remove_fields(&tree, &["items.0"]), tree);
    }

    #[test]
    fn test_missing_key_is_noop() {
        let tree = json!({"a": {"b": 1}});
        assert_eq!(remove_fields(&tree, &["a.x", "x.y.z", "a.b.c"]), tree);
    }

    #[test]
    fn test_top_level_key() {
        let tree = json!({"traceId": "abc", "data": 1});
        assert_eq!(remove_fields(&tree, &["traceId"]), json!({"data": 1}));
    }

    #[test]
    fn test_paths_apply_cumulatively() {
        let tree = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(remove_fields(&tree, &["a", "c"]), json!({"b": 2}));
    }

    #[test]
    fn test_numeric_segment_against_mapping_is_key_lookup() {
        let tree = json!({"0": {"id": 1}, "1": 2});
        let out = remove_fields(&tree, &["0.id", "1"]);
        assert_eq!(out, json!({"0": {}}));
    }

    #[test]
    fn test_name_against_sequence_broadcasts() {
        let tree = json!({"results": [{"createdAt": 1, "v": 1}, {"createdAt": 2}]});
        let out = remove_fields(&tree, &["results.createdAt"]);
        assert_eq!(out, json!({"results": [{"v": 1}, {}]}));
    }

    #[test]
    fn test_name_against_nested_sequences_broadcasts_through_all() {
        let tree = json!([[{"id": 1, "k": 1}], [{"id": 2}]]);
        let out = remove_fields(&tree, &["id"]);
        assert_eq!(out, json!([[{"k": 1}], [{}]]));
    }

    #[test]
    fn test_skip_policy_stops_at_sequence() {
        let tree = json!({"results": [{"createdAt": 1, "v": 1}]});
        let remover = FieldRemover::new(MismatchPolicy::Skip);
        assert_eq!(remover.remove(&tree, &["results.createdAt"]), tree);
        // Wildcards and indices are unaffected by the policy
        assert_eq!(
            remover.remove(&tree, &["results.*.createdAt"]),
            json!({"results": [{"v": 1}]})
        );
        assert_eq!(
            remover.remove(&tree, &["results.0.v"]),
            json!({"results": [{"createdAt": 1}]})
        );
    }

    #[test]
    fn test_signed_segment_is_not_an_index() {
        let tree = json!({"items": [{"id": 1}, {"id": 2}]});
        // "-1" takes the non-numeric path and broadcasts as a key
        let out = remove_fields(&tree, &["items.-1"]);
        assert_eq!(out, tree);
        let tree = json!({"items": [{"-1": 1, "id": 1}]});
        assert_eq!(remove_fields(&tree, &["items.-1"]), json!({"items": [{"id": 1}]}));
    }

    #[test]
    fn test_negative_segment_never_indexes_from_end() {
        let tree = json!({"items": [{"id": 1}, {"id": 2}]});
        for policy in [MismatchPolicy::Broadcast, MismatchPolicy::Skip] {
            let out = FieldRemover::new(policy).remove(&tree, &["items.-1.id"]);
            assert_eq!(out, tree);
        }
    }

    #[test]
    fn test_error_snapshot_tree() {
        let tree = json!({"error": "timeout"});
        assert_eq!(remove_fields(&tree, &["results.*.createdAt"]), tree);
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: MismatchPolicy = serde_json::from_value(json!("skip")).unwrap();
        assert_eq!(policy, MismatchPolicy::Skip);
        assert_eq!(MismatchPolicy::default(), MismatchPolicy::Broadcast);
    }
}
