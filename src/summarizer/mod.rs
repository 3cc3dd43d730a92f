//! Plan summarizing module.
//!
//! This module classifies each planned resource change, counts changes per
//! kind and renders one unified-diff-style fragment per affected resource.

mod diff;
mod summary;

pub use diff::{DiffFragment, DiffLine, KNOWN_AFTER_APPLY, SENSITIVE_VALUE};
pub use summary::{ChangeKind, PlanSummary, Summarizer, Summary};
