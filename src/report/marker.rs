//! Machine-readable report marker.
//!
//! Every report starts with a hidden HTML comment carrying the identity of
//! the run that produced it:
//!
//! ```text
//! <!-- terraform-report:{"run_id":123,"run_attempt":1,"sha":"abc123"} -->
//! ```
//!
//! Stale reports are detected by parsing this marker rather than by matching
//! rendered text. Only a marker on the first line of a comment counts, so a
//! human comment quoting a report is never mistaken for one.

use serde::{Deserialize, Serialize};

const MARKER_PREFIX: &str = "<!-- terraform-report:";
const MARKER_SUFFIX: &str = "-->";

/// Identity of the run that produced a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMarker {
    /// Workflow run ID.
    pub run_id: u64,
    /// Attempt number of the run, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_attempt: Option<u64>,
    /// Commit the run was triggered for.
    pub sha: String,
}

impl ReportMarker {
    /// Creates a marker for the given run.
    #[must_use]
    pub fn new(run_id: u64, run_attempt: Option<u64>, sha: impl Into<String>) -> Self {
        Self {
            run_id,
            run_attempt,
            sha: sha.into(),
        }
    }

    /// Renders the marker as a hidden HTML comment line.
    #[must_use]
    pub fn to_comment(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{MARKER_PREFIX}{json} {MARKER_SUFFIX}")
    }

    /// Extracts the marker from the first line of a comment body.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        let first = body.lines().next()?.trim();
        let json = first
            .strip_prefix(MARKER_PREFIX)?
            .strip_suffix(MARKER_SUFFIX)?
            .trim();
        serde_json::from_str(json).ok()
    }

    /// Returns true if a comment body is a report from a different run.
    #[must_use]
    pub fn is_stale(&self, body: &str) -> bool {
        Self::parse(body).is_some_and(|other| other != *self)
    }
}
