//! Report module.
//!
//! This module renders the pull request comment:
//! - Markdown layout with optional plan and diff sections
//! - Hidden marker identifying the run that produced a report
//! - Plan fingerprint shown in the footer

mod fingerprint;
mod marker;
mod renderer;

pub use fingerprint::PlanHasher;
pub use marker::ReportMarker;
pub use renderer::{
    MAX_COMMENT_CHARS, REPORT_TITLE, RenderOptions, ReportRenderer, RunInfo, fence, strip_ansi,
};
