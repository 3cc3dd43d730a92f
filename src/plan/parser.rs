//! Plan parser for loading and validating Terraform JSON plans.
//!
//! The parser locates `resource_changes` and, per entry, `address` and
//! `change.actions`/`change.before`/`change.after`. Everything else in the
//! document is ignored. The first structural violation is reported with its
//! location.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, PlanError, ReportError, Result};

use super::flatten::marked_paths;
use super::model::{Action, PlanDocument, PlannedChange};

/// Parser for Terraform JSON plans.
#[derive(Debug, Default)]
pub struct PlanParser;

impl PlanParser {
    /// Creates a new plan parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads and parses a plan from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the plan is malformed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PlanDocument> {
        let path = path.as_ref();
        info!("Loading plan from: {}", path.display());

        if !path.exists() {
            return Err(ReportError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    /// Parses a plan from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or the plan is malformed.
    pub fn parse_str(&self, content: &str) -> Result<PlanDocument> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            PlanError::malformed(
                format!("invalid JSON: {e}"),
                format!("line {}, column {}", e.line(), e.column()),
            )
        })?;
        self.parse_value(&value)
    }

    /// Parses a plan from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first structural violation.
    pub fn parse_value(&self, value: &Value) -> Result<PlanDocument> {
        let root = value
            .as_object()
            .ok_or_else(|| PlanError::malformed_general("plan root is not an object"))?;

        let format_version = optional_string(root, "format_version");
        let terraform_version = optional_string(root, "terraform_version");

        // Terraform omits the key entirely when nothing changes.
        let entries = match root.get("resource_changes") {
            None | Some(Value::Null) => {
                debug!("Plan has no resource_changes section");
                &[][..]
            }
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                return Err(PlanError::malformed("expected an array", "resource_changes").into());
            }
        };

        let mut seen = HashSet::with_capacity(entries.len());
        let mut resource_changes = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let change = Self::parse_entry(index, entry)?;
            if !seen.insert(change.address.clone()) {
                return Err(PlanError::DuplicateAddress {
                    address: change.address,
                }
                .into());
            }
            resource_changes.push(change);
        }

        debug!("Parsed {} resource changes", resource_changes.len());

        Ok(PlanDocument {
            format_version,
            terraform_version,
            resource_changes,
        })
    }

    /// Parses one `resource_changes` entry.
    fn parse_entry(index: usize, entry: &Value) -> Result<PlannedChange> {
        let location = format!("resource_changes[{index}]");

        let obj = entry
            .as_object()
            .ok_or_else(|| PlanError::malformed("expected an object", &location))?;

        let address = match obj.get("address") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => {
                return Err(PlanError::malformed(
                    "address must be a non-empty string",
                    format!("{location}.address"),
                )
                .into());
            }
            None => {
                return Err(
                    PlanError::malformed("missing field address", format!("{location}.address"))
                        .into(),
                );
            }
        };

        let change = match obj.get("change") {
            Some(Value::Object(change)) => change,
            Some(_) => {
                return Err(PlanError::malformed(
                    format!("change for {address} must be an object"),
                    format!("{location}.change"),
                )
                .into());
            }
            None => {
                return Err(PlanError::malformed(
                    format!("missing field change for {address}"),
                    format!("{location}.change"),
                )
                .into());
            }
        };

        let actions = Self::parse_actions(&address, &location, change)?;

        let before = non_null(change.get("before"));
        let after = non_null(change.get("after"));
        if before.is_none() && after.is_none() {
            return Err(PlanError::malformed(
                format!("change for {address} has neither before nor after"),
                format!("{location}.change"),
            )
            .into());
        }
        Self::check_snapshots(&address, &location, &actions, before.is_some(), after.is_some())?;

        let after_unknown = change
            .get("after_unknown")
            .map(marked_paths)
            .unwrap_or_default();

        let mut sensitive = change
            .get("before_sensitive")
            .map(marked_paths)
            .unwrap_or_default();
        if let Some(markers) = change.get("after_sensitive") {
            sensitive.extend(marked_paths(markers));
        }

        Ok(PlannedChange {
            address,
            mode: optional_string(obj, "mode"),
            resource_type: optional_string(obj, "type"),
            name: optional_string(obj, "name"),
            module_address: optional_string(obj, "module_address"),
            actions,
            before,
            after,
            after_unknown,
            sensitive,
        })
    }

    /// Checks that `before` and `after` are present exactly when the actions
    /// need them: a create has no `before`, a delete has no `after`, and an
    /// update or replacement has both. Reads, no-ops and unknown actions are
    /// not checked.
    fn check_snapshots(
        address: &str,
        location: &str,
        actions: &[Action],
        has_before: bool,
        has_after: bool,
    ) -> Result<()> {
        if actions.iter().any(|a| matches!(a, Action::Unsupported(_))) {
            return Ok(());
        }

        let deletes = actions.contains(&Action::Delete);
        let creates = actions.contains(&Action::Create);

        let (kind, expected) = if actions.contains(&Action::Replace) || (deletes && creates) {
            ("replacement", (true, true))
        } else if deletes {
            ("delete", (true, false))
        } else if creates {
            ("create", (false, true))
        } else if actions.contains(&Action::Update) {
            ("update", (true, true))
        } else {
            return Ok(());
        };

        if (has_before, has_after) == expected {
            return Ok(());
        }

        Err(PlanError::malformed(
            format!(
                "{kind} of {address} expects before {} and after {}",
                presence(expected.0),
                presence(expected.1)
            ),
            format!("{location}.change"),
        )
        .into())
    }

    /// Parses `change.actions` into typed actions, keeping unknown values.
    fn parse_actions(
        address: &str,
        location: &str,
        change: &Map<String, Value>,
    ) -> Result<Vec<Action>> {
        let raw = match change.get("actions") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(Value::Array(_)) => {
                return Err(PlanError::malformed(
                    format!("actions for {address} is empty"),
                    format!("{location}.change.actions"),
                )
                .into());
            }
            Some(_) => {
                return Err(PlanError::malformed(
                    format!("actions for {address} must be an array"),
                    format!("{location}.change.actions"),
                )
                .into());
            }
            None => {
                return Err(PlanError::malformed(
                    format!("missing field actions for {address}"),
                    format!("{location}.change.actions"),
                )
                .into());
            }
        };

        raw.iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(Action::parse).ok_or_else(|| {
                    PlanError::malformed(
                        format!("action for {address} must be a string"),
                        format!("{location}.change.actions[{i}]"),
                    )
                    .into()
                })
            })
            .collect()
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

const fn presence(present: bool) -> &'static str {
    if present { "present" } else { "absent" }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}
