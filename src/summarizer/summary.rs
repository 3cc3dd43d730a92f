//! Change classification and summary counts.
//!
//! Every resource change is classified into exactly one [`ChangeKind`] using
//! a fixed precedence: replace > delete > create > update > no-op.
//! Replacements are counted in their own bucket, so the bucket total always
//! equals the number of changes that do something.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::plan::{Action, PlanDocument, PlannedChange};

use super::diff::DiffFragment;

/// Stateless plan summarizer.
#[derive(Debug, Default)]
pub struct Summarizer;

/// Classified kind of a resource change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Resource will be created.
    Create,
    /// Resource will be updated in place.
    Update,
    /// Resource will be destroyed.
    Delete,
    /// Resource will be destroyed and created again.
    Replace,
    /// Nothing happens to the resource.
    NoOp,
}

/// Counts of resource changes per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Resources to create.
    pub create: usize,
    /// Resources to update in place.
    pub update: usize,
    /// Resources to destroy.
    pub delete: usize,
    /// Resources to replace.
    pub replace: usize,
}

/// Result of summarizing a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Aggregate counts.
    pub summary: Summary,
    /// One fragment per non-no-op change, in plan order.
    pub fragments: Vec<DiffFragment>,
}

impl Summarizer {
    /// Creates a new summarizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classifies a single resource change.
    ///
    /// # Errors
    ///
    /// Returns an error if the change lists an action this tool does not
    /// recognize.
    pub fn classify(&self, change: &PlannedChange) -> Result<ChangeKind> {
        if let Some(raw) = change.unsupported_action() {
            return Err(PlanError::UnsupportedAction {
                address: change.address.clone(),
                action: raw.to_string(),
            }
            .into());
        }

        let deletes = change.has_action(&Action::Delete);
        let creates = change.has_action(&Action::Create);

        let kind = if change.has_action(&Action::Replace) || (deletes && creates) {
            ChangeKind::Replace
        } else if deletes {
            ChangeKind::Delete
        } else if creates {
            ChangeKind::Create
        } else if change.has_action(&Action::Update) {
            ChangeKind::Update
        } else {
            // no-op, and `read` for data sources
            ChangeKind::NoOp
        };

        Ok(kind)
    }

    /// Lazily yields one fragment per non-no-op change in plan order.
    ///
    /// Classification errors are yielded in place of the fragment.
    pub fn fragments<'a>(
        &'a self,
        plan: &'a PlanDocument,
    ) -> impl Iterator<Item = Result<DiffFragment>> + 'a {
        plan.resource_changes
            .iter()
            .filter_map(move |change| match self.classify(change) {
                Ok(ChangeKind::NoOp) => None,
                Ok(kind) => Some(Ok(DiffFragment::build(change, kind))),
                Err(e) => Some(Err(e)),
            })
    }

    /// Summarizes a plan into counts and diff fragments.
    ///
    /// # Errors
    ///
    /// Returns an error on the first change with an unsupported action.
    pub fn summarize(&self, plan: &PlanDocument) -> Result<PlanSummary> {
        let mut summary = Summary::default();
        let mut fragments = Vec::new();

        for fragment in self.fragments(plan) {
            let fragment = fragment?;
            debug!("{} {}", fragment.address, fragment.action_label());
            summary.record(fragment.kind);
            fragments.push(fragment);
        }

        info!(
            "Plan summary: {} to create, {} to update, {} to delete, {} to replace",
            summary.create, summary.update, summary.delete, summary.replace
        );

        Ok(PlanSummary { summary, fragments })
    }
}

impl ChangeKind {
    /// Returns the human-readable action label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "will be created",
            Self::Update => "will be updated in-place",
            Self::Delete => "will be destroyed",
            Self::Replace => "must be replaced",
            Self::NoOp => "has no changes",
        }
    }
}

impl Summary {
    /// Counts one change of the given kind.
    pub const fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Create => self.create += 1,
            ChangeKind::Update => self.update += 1,
            ChangeKind::Delete => self.delete += 1,
            ChangeKind::Replace => self.replace += 1,
            ChangeKind::NoOp => {}
        }
    }

    /// Returns the number of changes across all buckets.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.create + self.update + self.delete + self.replace
    }

    /// Returns true if the plan changes anything.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.total() > 0
    }

    /// Resources Terraform reports as "to add" (replacements included).
    #[must_use]
    pub const fn to_add(&self) -> usize {
        self.create + self.replace
    }

    /// Resources Terraform reports as "to change".
    #[must_use]
    pub const fn to_change(&self) -> usize {
        self.update
    }

    /// Resources Terraform reports as "to destroy" (replacements included).
    #[must_use]
    pub const fn to_destroy(&self) -> usize {
        self.delete + self.replace
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::NoOp => "no-op",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.to_add(),
            self.to_change(),
            self.to_destroy()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::plan::PlanParser;
    use serde_json::json;

    fn plan(value: &serde_json::Value) -> PlanDocument {
        PlanParser::new()
            .parse_value(value)
            .expect("test plan should parse")
    }

    fn entry(address: &str, actions: &[&str], before: serde_json::Value, after: serde_json::Value) -> serde_json::Value {
        json!({
            "address": address,
            "change": { "actions": actions, "before": before, "after": after }
        })
    }

    fn mixed_plan() -> PlanDocument {
        plan(&json!({
            "resource_changes": [
                entry("aws_instance.a", &["create"], json!(null), json!({ "ami": "x" })),
                entry("aws_instance.b", &["no-op"], json!({ "ami": "y" }), json!({ "ami": "y" })),
                entry("aws_instance.c", &["update"], json!({ "a": 1, "b": 2 }), json!({ "a": 1, "b": 3 })),
                entry("aws_instance.d", &["delete", "create"], json!({ "ami": "1" }), json!({ "ami": "2" })),
                entry("aws_instance.e", &["delete"], json!({ "ami": "z" }), json!(null)),
                entry("data.aws_ami.f", &["read"], json!(null), json!({ "id": "ami" })),
                entry("aws_instance.g", &["create", "delete"], json!({ "ami": "1" }), json!({ "ami": "3" })),
            ]
        }))
    }

    #[test]
    fn test_two_creates_one_update() {
        let doc = plan(&json!({
            "resource_changes": [
                entry("aws_instance.a", &["create"], json!(null), json!({ "ami": "x" })),
                entry("aws_instance.b", &["update"], json!({ "ami": "x" }), json!({ "ami": "y" })),
                entry("aws_instance.c", &["create"], json!(null), json!({ "ami": "z" })),
            ]
        }));

        let result = Summarizer::new().summarize(&doc).expect("summarize should succeed");

        assert_eq!(result.summary.create, 2);
        assert_eq!(result.summary.update, 1);
        assert_eq!(result.summary.delete, 0);
        assert_eq!(result.summary.replace, 0);
        assert_eq!(result.fragments.len(), 3);
    }

    #[test]
    fn test_bucket_total_matches_actionable_changes() {
        let doc = mixed_plan();
        let result = Summarizer::new().summarize(&doc).expect("summarize should succeed");

        // b is no-op and f is a data source read
        assert_eq!(result.summary.total(), 5);
        assert_eq!(result.fragments.len(), result.summary.total());
    }

    #[test]
    fn test_fragments_follow_plan_order() {
        let doc = mixed_plan();
        let result = Summarizer::new().summarize(&doc).expect("summarize should succeed");

        let addresses: Vec<&str> = result.fragments.iter().map(|f| f.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec![
                "aws_instance.a",
                "aws_instance.c",
                "aws_instance.d",
                "aws_instance.e",
                "aws_instance.g"
            ]
        );
    }

    #[test]
    fn test_replace_has_its_own_bucket() {
        let doc = mixed_plan();
        let summary = Summarizer::new().summarize(&doc).expect("summarize should succeed").summary;

        assert_eq!(summary.replace, 2);
        assert_eq!(summary.create, 1);
        assert_eq!(summary.delete, 1);
        assert_eq!(summary.to_add(), 3);
        assert_eq!(summary.to_destroy(), 3);
        assert_eq!(summary.to_change(), 1);
    }

    #[test]
    fn test_classification_precedence() {
        let summarizer = Summarizer::new();
        let doc = mixed_plan();
        let kinds: Vec<ChangeKind> = doc
            .resource_changes
            .iter()
            .map(|c| summarizer.classify(c).expect("known actions"))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ChangeKind::Create,
                ChangeKind::NoOp,
                ChangeKind::Update,
                ChangeKind::Replace,
                ChangeKind::Delete,
                ChangeKind::NoOp,
                ChangeKind::Replace,
            ]
        );
    }

    #[test]
    fn test_unknown_action_fails() {
        let doc = plan(&json!({
            "resource_changes": [
                entry("aws_instance.a", &["create"], json!(null), json!({ "ami": "x" })),
                entry("aws_s3_bucket.logs", &["archive"], json!({ "acl": "private" }), json!(null)),
            ]
        }));

        let err = Summarizer::new().summarize(&doc).expect_err("unknown action must fail");
        match err {
            ReportError::Plan(PlanError::UnsupportedAction { address, action }) => {
                assert_eq!(address, "aws_s3_bucket.logs");
                assert_eq!(action, "archive");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lazy_fragments_stop_at_caller() {
        let doc = mixed_plan();
        let summarizer = Summarizer::new();
        let first = summarizer
            .fragments(&doc)
            .next()
            .expect("plan has changes")
            .expect("first change is valid");

        assert_eq!(first.address, "aws_instance.a");
        assert_eq!(first.kind, ChangeKind::Create);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let doc = mixed_plan();
        let summarizer = Summarizer::new();

        let first = summarizer.summarize(&doc).expect("summarize should succeed");
        let second = summarizer.summarize(&doc).expect("summarize should succeed");

        assert_eq!(first, second);
        let bodies = |s: &PlanSummary| s.fragments.iter().map(DiffFragment::body).collect::<Vec<_>>();
        assert_eq!(bodies(&first), bodies(&second));
    }

    #[test]
    fn test_empty_plan() {
        let doc = plan(&json!({}));
        let result = Summarizer::new().summarize(&doc).expect("summarize should succeed");

        assert!(!result.summary.has_changes());
        assert!(result.fragments.is_empty());
        assert_eq!(result.summary.to_string(), "0 to add, 0 to change, 0 to destroy");
    }
}
