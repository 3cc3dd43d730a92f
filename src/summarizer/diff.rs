//! Per-resource diff fragments.
//!
//! A fragment lists the attribute-level differences of one resource as
//! `+`/`-`/` ` prefixed lines, with attributes flattened to dotted paths and
//! sorted so that identical plans always render identically.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::plan::{PlannedChange, flatten_attributes, has_marked_ancestor, is_marked};

use super::summary::ChangeKind;

/// Placeholder rendered for attributes marked sensitive.
pub const SENSITIVE_VALUE: &str = "(sensitive value)";

/// Placeholder rendered for attributes only known after apply.
pub const KNOWN_AFTER_APPLY: &str = "(known after apply)";

/// One attribute line of a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DiffLine {
    /// Attribute present only after the change, or its new value.
    Added {
        /// Flattened attribute path.
        key: String,
        /// Rendered value.
        value: String,
    },
    /// Attribute present only before the change, or its old value.
    Removed {
        /// Flattened attribute path.
        key: String,
        /// Rendered value.
        value: String,
    },
    /// Attribute with the same value on both sides.
    Unchanged {
        /// Flattened attribute path.
        key: String,
        /// Rendered value.
        value: String,
    },
}

/// Diff of a single resource change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffFragment {
    /// Resource address.
    pub address: String,
    /// Classified kind of change.
    pub kind: ChangeKind,
    /// Attribute lines in key order.
    pub lines: Vec<DiffLine>,
}

impl DiffFragment {
    /// Builds the fragment for a classified change.
    #[must_use]
    pub fn build(change: &PlannedChange, kind: ChangeKind) -> Self {
        let empty = Value::Null;
        let before = flatten_attributes(change.before.as_ref().unwrap_or(&empty));
        let after = flatten_attributes(change.after.as_ref().unwrap_or(&empty));

        let lines = match kind {
            ChangeKind::Delete => before
                .iter()
                .map(|(key, value)| DiffLine::Removed {
                    key: key.clone(),
                    value: render(change, key, value),
                })
                .collect(),
            ChangeKind::Create => collect_keys(&BTreeMap::new(), &after, &change.after_unknown)
                .into_iter()
                .filter_map(|key| {
                    new_value(change, &after, &key).map(|value| DiffLine::Added { key, value })
                })
                .collect(),
            ChangeKind::Update | ChangeKind::Replace => {
                compare(change, &before, &after)
            }
            ChangeKind::NoOp => Vec::new(),
        };

        Self {
            address: change.address.clone(),
            kind,
            lines,
        }
    }

    /// Returns the human-readable action label (e.g. "will be created").
    #[must_use]
    pub const fn action_label(&self) -> &'static str {
        self.kind.label()
    }

    /// Returns the number of added lines.
    #[must_use]
    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Added { .. }))
            .count()
    }

    /// Returns the number of removed lines.
    #[must_use]
    pub fn removals(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Removed { .. }))
            .count()
    }

    /// Renders the fragment as a unified-diff-like text block.
    #[must_use]
    pub fn body(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {} {}", self.address, self.action_label());
        let _ = writeln!(out, "--- a/{}", self.address);
        let _ = write!(out, "+++ b/{}", self.address);
        for line in &self.lines {
            let _ = write!(out, "\n{line}");
        }
        out
    }
}

/// Compares both sides of an update or replacement.
fn compare(
    change: &PlannedChange,
    before: &BTreeMap<String, Value>,
    after: &BTreeMap<String, Value>,
) -> Vec<DiffLine> {
    let mut lines = Vec::new();

    for key in collect_keys(before, after, &change.after_unknown) {
        let old = before.get(&key);
        let unknown = is_marked(&change.after_unknown, &key);

        if let Some(old_value) = old
            && !unknown
            && after.get(&key) == Some(old_value)
        {
            lines.push(DiffLine::Unchanged {
                value: render(change, &key, old_value),
                key,
            });
            continue;
        }

        if let Some(old_value) = old {
            lines.push(DiffLine::Removed {
                key: key.clone(),
                value: render(change, &key, old_value),
            });
        }
        if let Some(value) = new_value(change, after, &key) {
            lines.push(DiffLine::Added { key, value });
        }
    }

    lines
}

/// Union of attribute keys on both sides plus paths unknown until apply.
fn collect_keys(
    before: &BTreeMap<String, Value>,
    after: &BTreeMap<String, Value>,
    unknown: &BTreeSet<String>,
) -> BTreeSet<String> {
    before
        .keys()
        .chain(after.keys())
        .chain(unknown.iter())
        .cloned()
        .collect()
}

/// Rendered value of `key` after the change, if it has one.
///
/// A path under an unknown ancestor has none of its own: the ancestor's
/// single `(known after apply)` line stands for it.
fn new_value(change: &PlannedChange, after: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    if has_marked_ancestor(&change.after_unknown, key) {
        return None;
    }
    if change.after_unknown.contains(key) {
        return Some(KNOWN_AFTER_APPLY.to_string());
    }
    after.get(key).map(|value| render(change, key, value))
}

fn render(change: &PlannedChange, key: &str, value: &Value) -> String {
    if is_marked(&change.sensitive, key) {
        return SENSITIVE_VALUE.to_string();
    }
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, key, value) = match self {
            Self::Added { key, value } => ('+', key, value),
            Self::Removed { key, value } => ('-', key, value),
            Self::Unchanged { key, value } => (' ', key, value),
        };
        if key.is_empty() {
            write!(f, "{prefix} {value}")
        } else {
            write!(f, "{prefix} {key} = {value}")
        }
    }
}

impl std::fmt::Display for DiffFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.body())
    }
}
