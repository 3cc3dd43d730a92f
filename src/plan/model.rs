//! Typed plan representation.
//!
//! These types are the validated form of the `resource_changes` section of a
//! Terraform JSON plan. They are produced by [`super::PlanParser`] and never
//! mutated afterwards.

use serde_json::Value;
use std::collections::BTreeSet;

/// A single action Terraform reports for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The resource will be created.
    Create,
    /// A data source will be read.
    Read,
    /// The resource will be updated in place.
    Update,
    /// The resource will be destroyed.
    Delete,
    /// The resource will be replaced (explicit form).
    Replace,
    /// Nothing will happen to the resource.
    NoOp,
    /// An action value this tool does not recognize, kept verbatim.
    Unsupported(String),
}

/// One planned mutation to a single resource.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    /// Full resource address, unique within a plan.
    pub address: String,
    /// Resource mode (`managed` or `data`).
    pub mode: Option<String>,
    /// Resource type (e.g. `aws_instance`).
    pub resource_type: Option<String>,
    /// Resource name within its module.
    pub name: Option<String>,
    /// Address of the containing module, if not the root module.
    pub module_address: Option<String>,
    /// Ordered actions; `[delete, create]` and `[create, delete]` are replacements.
    pub actions: Vec<Action>,
    /// Attribute snapshot before the change.
    pub before: Option<Value>,
    /// Attribute snapshot after the change.
    pub after: Option<Value>,
    /// Flattened attribute paths only known after apply.
    pub after_unknown: BTreeSet<String>,
    /// Flattened attribute paths marked sensitive on either side.
    pub sensitive: BTreeSet<String>,
}

/// A parsed Terraform plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanDocument {
    /// Plan format version reported by Terraform.
    pub format_version: Option<String>,
    /// Terraform version that produced the plan.
    pub terraform_version: Option<String>,
    /// Resource changes in document order.
    pub resource_changes: Vec<PlannedChange>,
}

impl Action {
    /// Parses a raw action string from the plan.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "create" => Self::Create,
            "read" => Self::Read,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "replace" => Self::Replace,
            "no-op" => Self::NoOp,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Returns the action as it appears in the plan.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::NoOp => "no-op",
            Self::Unsupported(raw) => raw,
        }
    }
}

impl PlannedChange {
    /// Returns true if the change lists the given action.
    #[must_use]
    pub fn has_action(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }

    /// Returns the first unsupported action, if any.
    #[must_use]
    pub fn unsupported_action(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            Action::Unsupported(raw) => Some(raw.as_str()),
            _ => None,
        })
    }
}

impl PlanDocument {
    /// Returns the number of resource changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resource_changes.len()
    }

    /// Returns true if the plan lists no resource changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_changes.is_empty()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
