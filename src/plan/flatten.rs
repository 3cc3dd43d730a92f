//! Attribute path flattening.
//!
//! Nested attribute values are flattened to dotted paths so that two
//! snapshots can be compared line by line. Object keys become path segments
//! and array elements use their index (`ingress.0.from_port`). Keys that
//! would make a path ambiguous are quoted: `labels["app.kubernetes.io/name"]`.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Flattens an attribute snapshot into a sorted map of path to leaf value.
///
/// `null` leaves are omitted. Empty nested objects and arrays are kept as
/// leaves so that they still show up in a diff. A top-level scalar is stored
/// under the empty path.
#[must_use]
pub fn flatten_attributes(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&join("", key), child, &mut out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(&i.to_string(), child, &mut out);
            }
        }
        Value::Null => {}
        scalar => {
            out.insert(String::new(), scalar.clone());
        }
    }
    out
}

fn flatten_into(path: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Null => {}
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(&join(path, key), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(&join(path, &i.to_string()), child, out);
            }
        }
        leaf => {
            out.insert(path.to_string(), leaf.clone());
        }
    }
}

/// Collects the paths marked `true` in a Terraform marker structure.
///
/// Terraform reports `after_unknown` and `*_sensitive` as a structure that
/// mirrors the attributes, with `true` at every marked position. A bare
/// `true` marks the whole value and yields the empty path.
#[must_use]
pub fn marked_paths(markers: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_marked("", markers, &mut out);
    out
}

fn collect_marked(path: &str, value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Bool(true) => {
            out.insert(path.to_string());
        }
        Value::Object(map) => {
            for (key, child) in map {
                collect_marked(&join(path, key), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_marked(&join(path, &i.to_string()), child, out);
            }
        }
        _ => {}
    }
}

/// Returns true if `path` or any of its ancestors is in `marked`.
#[must_use]
pub fn is_marked(marked: &BTreeSet<String>, path: &str) -> bool {
    marked.contains(path) || has_marked_ancestor(marked, path)
}

/// Returns true if a strict ancestor of `path` is in `marked`.
///
/// The empty path is the ancestor of every other path.
#[must_use]
pub fn has_marked_ancestor(marked: &BTreeSet<String>, path: &str) -> bool {
    if marked.is_empty() || path.is_empty() {
        return false;
    }
    marked.contains("") || ancestors(path).any(|a| marked.contains(a))
}

/// Strict non-empty ancestors of a path, shortest first.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut in_quote = false;
    let mut escaped = false;

    path.char_indices().filter_map(move |(i, c)| {
        if in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quote = false;
            }
            return None;
        }
        match c {
            '"' => {
                in_quote = true;
                None
            }
            '.' | '[' if i > 0 => Some(&path[..i]),
            _ => None,
        }
    })
}

/// Appends one segment to a path, quoting it if it is ambiguous on its own.
fn join(prefix: &str, segment: &str) -> String {
    if needs_quoting(segment) {
        let quoted = serde_json::to_string(segment).unwrap_or_else(|_| format!("\"{segment}\""));
        format!("{prefix}[{quoted}]")
    } else if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn needs_quoting(segment: &str) -> bool {
    segment.is_empty() || segment.contains(['.', '[', ']', '"', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_objects_and_arrays() {
        let value = json!({
            "ami": "ami-123",
            "tags": { "Name": "web", "Env": "prod" },
            "ingress": [{ "from_port": 22 }, { "from_port": 443 }],
        });

        let flat = flatten_attributes(&value);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();

        assert_eq!(
            keys,
            vec![
                "ami",
                "ingress.0.from_port",
                "ingress.1.from_port",
                "tags.Env",
                "tags.Name"
            ]
        );
        assert_eq!(flat["ingress.1.from_port"], json!(443));
    }

    #[test]
    fn test_flatten_skips_nulls_and_keeps_empty_containers() {
        let value = json!({ "a": null, "b": {}, "c": [], "d": false });
        let flat = flatten_attributes(&value);

        assert!(!flat.contains_key("a"));
        assert_eq!(flat["b"], json!({}));
        assert_eq!(flat["c"], json!([]));
        assert_eq!(flat["d"], json!(false));
    }

    #[test]
    fn test_marked_paths() {
        let markers = json!({
            "id": true,
            "arn": false,
            "ebs": [{ "volume_id": true }],
        });
        let paths = marked_paths(&markers);

        assert!(paths.contains("id"));
        assert!(paths.contains("ebs.0.volume_id"));
        assert!(!paths.contains("arn"));
    }

    #[test]
    fn test_is_marked_checks_ancestors() {
        let marked: BTreeSet<String> = [String::from("tags")].into_iter().collect();

        assert!(is_marked(&marked, "tags"));
        assert!(is_marked(&marked, "tags.Name"));
        assert!(!is_marked(&marked, "tags_all.Name"));

        let whole = marked_paths(&json!(true));
        assert!(is_marked(&whole, "anything.at.all"));
    }

    #[test]
    fn test_dotted_keys_do_not_collide_with_nested_paths() {
        let value = json!({
            "labels": { "a.b": "literal" },
            "labels.a": { "b": "nested" },
        });
        let flat = flatten_attributes(&value);

        assert_eq!(flat.len(), 2);
        assert_eq!(flat["labels[\"a.b\"]"], json!("literal"));
        assert_eq!(flat["[\"labels.a\"].b"], json!("nested"));
    }

    #[test]
    fn test_quoted_paths_match_their_own_ancestors_only() {
        let marked = marked_paths(&json!({ "labels": { "a": true } }));
        assert!(marked.contains("labels.a"));
        assert!(!is_marked(&marked, "[\"labels.a\"].b"));

        let quoted = marked_paths(&json!({ "metadata": { "app.kubernetes.io/name": true } }));
        assert!(is_marked(&quoted, "metadata[\"app.kubernetes.io/name\"]"));
        assert!(!is_marked(&quoted, "metadata"));

        let parent = marked_paths(&json!({ "metadata": true }));
        assert!(is_marked(&parent, "metadata[\"app.kubernetes.io/name\"]"));
        assert!(has_marked_ancestor(&parent, "metadata[\"x.y\"].z"));
        assert!(!has_marked_ancestor(&parent, "metadata"));
    }
}
