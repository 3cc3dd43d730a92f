//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats, plus GitHub Actions
//! workflow command annotations.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::reporter::RunOutcome;
use crate::summarizer::{ChangeKind, PlanSummary};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Resource change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "+")]
    additions: usize,
    #[tabled(rename = "-")]
    removals: usize,
}

/// Severity of a workflow annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// `::error::`
    Error,
    /// `::warning::`
    Warning,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan summary for display.
    #[must_use]
    pub fn format_summary(&self, plan: &PlanSummary) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_summary_text(plan),
        }
    }

    /// Formats a summary as text.
    fn format_summary_text(plan: &PlanSummary) -> String {
        if plan.fragments.is_empty() {
            return format!(
                "{} No changes. Infrastructure matches the configuration.\n",
                "✓".green()
            );
        }

        let rows: Vec<ChangeRow> = plan
            .fragments
            .iter()
            .enumerate()
            .map(|(i, f)| ChangeRow {
                index: i + 1,
                action: Self::format_change_kind(f.kind),
                resource: f.address.clone(),
                additions: f.additions(),
                removals: f.removals(),
            })
            .collect();

        let mut output = String::from("\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let summary = &plan.summary;
        let _ = write!(
            output,
            "\nPlan: {} to add, {} to change, {} to destroy",
            summary.to_add().to_string().green(),
            summary.to_change().to_string().yellow(),
            summary.to_destroy().to_string().red()
        );
        if summary.replace > 0 {
            let _ = write!(output, " ({} to replace)", summary.replace.to_string().magenta());
        }
        output.push('\n');

        output
    }

    /// Formats the outcome of a publish run.
    #[must_use]
    pub fn format_outcome(&self, outcome: &RunOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => match outcome {
                RunOutcome::Posted { .. } => format!("{} {outcome}\n", "✓".green()),
                RunOutcome::SkippedClosed { .. } => format!("{} {outcome}\n", "⚠".yellow()),
            },
        }
    }

    /// Formats a change kind with color.
    fn format_change_kind(kind: ChangeKind) -> String {
        match kind {
            ChangeKind::Create => "+create".green().to_string(),
            ChangeKind::Update => "~update".yellow().to_string(),
            ChangeKind::Delete => "-delete".red().to_string(),
            ChangeKind::Replace => "-/+replace".magenta().to_string(),
            ChangeKind::NoOp => "noop".dimmed().to_string(),
        }
    }
}

/// Writes command output to stdout.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn write_stdout(content: &str) -> Result<()> {
    use std::io::Write as _;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

/// Builds a workflow command line such as `::error::message`.
///
/// `%`, `\r` and `\n` are escaped so multi-line messages stay one command.
#[must_use]
pub fn workflow_command(level: Annotation, message: &str) -> String {
    let command = match level {
        Annotation::Error => "error",
        Annotation::Warning => "warning",
    };
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{command}::{escaped}")
}

/// Emits a workflow annotation when running inside GitHub Actions.
pub fn annotate(level: Annotation, message: &str) {
    let in_actions = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
    if in_actions {
        let _ = write_stdout(&workflow_command(level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::{DiffFragment, DiffLine, Summary};

    fn plan() -> PlanSummary {
        PlanSummary {
            summary: Summary {
                create: 1,
                update: 0,
                delete: 0,
                replace: 1,
            },
            fragments: vec![
                DiffFragment {
                    address: String::from("aws_instance.web"),
                    kind: ChangeKind::Create,
                    lines: vec![DiffLine::Added {
                        key: String::from("ami"),
                        value: String::from("\"ami-1\""),
                    }],
                },
                DiffFragment {
                    address: String::from("aws_s3_bucket.logs"),
                    kind: ChangeKind::Replace,
                    lines: vec![
                        DiffLine::Removed {
                            key: String::from("bucket"),
                            value: String::from("\"old\""),
                        },
                        DiffLine::Added {
                            key: String::from("bucket"),
                            value: String::from("\"new\""),
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_format_summary_text() {
        let output = OutputFormatter::new(OutputFormat::Text).format_summary(&plan());

        assert!(output.contains("aws_instance.web"));
        assert!(output.contains("aws_s3_bucket.logs"));
        assert!(output.contains(" to add, "));
        assert!(output.contains(" to replace)"));
    }

    #[test]
    fn test_format_summary_no_changes() {
        let empty = PlanSummary {
            summary: Summary::default(),
            fragments: Vec::new(),
        };
        let output = OutputFormatter::new(OutputFormat::Text).format_summary(&empty);
        assert!(output.contains("No changes."));
    }

    #[test]
    fn test_format_summary_json() {
        let output = OutputFormatter::new(OutputFormat::Json).format_summary(&plan());
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["summary"]["replace"], 1);
        assert_eq!(value["fragments"][1]["kind"], "replace");
        assert_eq!(value["fragments"][1]["lines"][0]["op"], "removed");
    }

    #[test]
    fn test_format_outcome_json() {
        let outcome = RunOutcome::SkippedClosed { number: 4 };
        let output = OutputFormatter::new(OutputFormat::Json).format_outcome(&outcome);
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["outcome"], "skipped_closed");
        assert_eq!(value["number"], 4);
    }

    #[test]
    fn test_workflow_command_escapes_newlines() {
        assert_eq!(
            workflow_command(Annotation::Error, "bad input\n100%"),
            "::error::bad input%0A100%25"
        );
        assert_eq!(
            workflow_command(Annotation::Warning, "closed"),
            "::warning::closed"
        );
    }
}
