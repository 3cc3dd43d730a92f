//! Markdown report rendering.
//!
//! Builds the pull request comment body from a summarized plan, the textual
//! plan output and the identity of the current run.

use std::fmt::Write;
use tracing::{debug, warn};

use crate::summarizer::PlanSummary;

use super::fingerprint::PlanHasher;
use super::marker::ReportMarker;

/// Title shown at the top of every report.
pub const REPORT_TITLE: &str = ":robot: Terraform Report";

/// Maximum comment length accepted by GitHub, in characters.
pub const MAX_COMMENT_CHARS: usize = 65_536;

/// Which optional sections to include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Include the raw plan text.
    pub show_plan: bool,
    /// Include the per-resource diff.
    pub show_diff: bool,
}

/// Identity and links of the workflow run producing the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    /// Marker embedded at the top of the report.
    pub marker: ReportMarker,
    /// Link to the workflow run.
    pub run_url: String,
}

/// Markdown report renderer.
#[derive(Debug, Default)]
pub struct ReportRenderer {
    /// Section options.
    options: RenderOptions,
    /// Plan hasher for the footer fingerprint.
    hasher: PlanHasher,
}

impl ReportRenderer {
    /// Creates a renderer with the given options.
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self {
            options,
            hasher: PlanHasher::new(),
        }
    }

    /// Renders the report.
    ///
    /// Sections that would push the comment over GitHub's size limit are
    /// dropped, plan text first, and replaced by a short note.
    #[must_use]
    pub fn render(&self, plan: &PlanSummary, plan_text: &str, run: Option<&RunInfo>) -> String {
        let mut options = self.options;
        let mut omitted = Vec::new();

        loop {
            let body = self.render_with(options, &omitted, plan, plan_text, run);
            let len = body.chars().count();
            if len <= MAX_COMMENT_CHARS {
                debug!("Rendered report ({len} characters)");
                return body;
            }

            if options.show_plan {
                warn!("Report too long ({len} characters), omitting plan output");
                options.show_plan = false;
                omitted.push("plan output");
            } else if options.show_diff {
                warn!("Report too long ({len} characters), omitting diff");
                options.show_diff = false;
                omitted.push("diff");
            } else {
                return body;
            }
        }
    }

    fn render_with(
        &self,
        options: RenderOptions,
        omitted: &[&str],
        plan: &PlanSummary,
        plan_text: &str,
        run: Option<&RunInfo>,
    ) -> String {
        let mut out = String::new();
        let summary = &plan.summary;

        if let Some(run) = run {
            let _ = writeln!(out, "{}", run.marker.to_comment());
        }
        let _ = writeln!(out, "### {REPORT_TITLE}");
        let _ = writeln!(out, "---");
        let _ = write!(
            out,
            "##### Summary: `{}` to add, `{}` to change, `{}` to destroy",
            summary.to_add(),
            summary.to_change(),
            summary.to_destroy()
        );
        if summary.replace > 0 {
            let _ = write!(out, " (`{}` to replace)", summary.replace);
        }
        out.push('\n');

        if options.show_plan {
            let _ = write!(
                out,
                "\n<details><summary>Show Plan</summary>\n\n{}\n</details>\n",
                fence("terraform", &strip_ansi(plan_text))
            );
        }

        if options.show_diff {
            let diff = if plan.fragments.is_empty() {
                String::from("No changes.")
            } else {
                plan.fragments
                    .iter()
                    .map(|f| fence("diff", &f.body()))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            };
            let _ = write!(
                out,
                "\n<details><summary>Show Diff</summary>\n\n{diff}\n</details>\n"
            );
        }

        for section in omitted {
            let _ = write!(
                out,
                "\n_The {section} was omitted because the comment would exceed GitHub's size limit._\n"
            );
        }

        let _ = write!(out, "\n---\n");
        let _ = write!(out, "This comment was generated by terraform-report");
        if let Some(run) = run {
            let _ = write!(
                out,
                " - action run [#{}]({}) - commit {}",
                run.marker.run_id, run.run_url, run.marker.sha
            );
        }
        let _ = writeln!(out, " - plan `{}`", self.hasher.short_hash(plan));

        out
    }
}

/// Wraps content in a fenced code block that its own backticks cannot close.
#[must_use]
pub fn fence(lang: &str, content: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(content).max(2) + 1);
    let content = content.trim_end_matches(['\n', '\r']);
    format!("{ticks}{lang}\n{content}\n{ticks}")
}

fn longest_backtick_run(content: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Removes ANSI color sequences left in plan output run without `-no-color`.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // parameters and intermediates, then one final byte in @..~
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }

    out
}
