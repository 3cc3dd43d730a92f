//! Plan fingerprinting.
//!
//! A deterministic hash of the summarized plan, shown in the report footer so
//! reviewers can tell at a glance whether two runs planned the same changes.

use sha2::{Digest, Sha256};

use crate::summarizer::PlanSummary;

/// Number of hex characters shown in reports.
const SHORT_LEN: usize = 12;

/// Hasher for computing plan fingerprints.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the full hex fingerprint of a summarized plan.
    ///
    /// Only the fragments feed the hash; counts are derived from them.
    #[must_use]
    pub fn hash_plan(&self, plan: &PlanSummary) -> String {
        let mut hasher = Sha256::new();

        for fragment in &plan.fragments {
            hasher.update(fragment.body().as_bytes());
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Computes the shortened fingerprint shown in reports.
    #[must_use]
    pub fn short_hash(&self, plan: &PlanSummary) -> String {
        let mut hash = self.hash_plan(plan);
        hash.truncate(SHORT_LEN);
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanParser;
    use crate::summarizer::Summarizer;
    use serde_json::json;

    fn summarize(after: &serde_json::Value) -> PlanSummary {
        let doc = PlanParser::new()
            .parse_value(&json!({
                "resource_changes": [
                    { "address": "a.b", "change": { "actions": ["create"], "after": after } }
                ]
            }))
            .expect("plan should parse");
        Summarizer::new().summarize(&doc).expect("summarize should succeed")
    }

    #[test]
    fn test_plan_hash_deterministic() {
        let hasher = PlanHasher::new();
        let plan = summarize(&json!({ "a": 1 }));

        assert_eq!(hasher.hash_plan(&plan), hasher.hash_plan(&plan));
        assert_eq!(hasher.hash_plan(&plan).len(), 64);
        assert_eq!(hasher.short_hash(&plan).len(), SHORT_LEN);
    }

    #[test]
    fn test_different_plans_different_hash() {
        let hasher = PlanHasher::new();

        assert_ne!(
            hasher.hash_plan(&summarize(&json!({ "a": 1 }))),
            hasher.hash_plan(&summarize(&json!({ "a": 2 })))
        );
    }
}
