//! Report runner for one workflow run.
//!
//! This module wires the pieces together: it checks the pull request is
//! still open, builds the report from the plan files, removes reports left
//! by earlier runs and posts the new one.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{GitHubContext, ReportConfig};
use crate::error::Result;
use crate::github::{CommentPublisher, stale_reports};
use crate::plan::PlanParser;
use crate::report::{ReportMarker, ReportRenderer, RunInfo};
use crate::summarizer::{PlanSummary, Summarizer};

/// Runner posting the report for one workflow run.
pub struct ReportRunner<'a> {
    /// Run configuration.
    config: &'a ReportConfig,
    /// Workflow context.
    context: &'a GitHubContext,
    /// Comment backend.
    publisher: Arc<dyn CommentPublisher>,
}

/// Outcome of a report run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The report was posted.
    Posted {
        /// ID of the new comment.
        comment_id: u64,
        /// Web URL of the new comment.
        html_url: Option<String>,
        /// Stale reports deleted.
        removed: usize,
        /// Stale reports that could not be deleted.
        failed_removals: usize,
    },
    /// The pull request is closed; nothing was posted.
    SkippedClosed {
        /// Pull request number.
        number: u64,
    },
}

/// Result of a stale report cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cleanup {
    removed: usize,
    failed: usize,
}

/// A rendered report together with the summary it was built from.
#[derive(Debug, Clone)]
pub struct BuiltReport {
    /// Summarized plan.
    pub plan: PlanSummary,
    /// Markdown comment body.
    pub body: String,
}

/// Reads both plan files, summarizes the plan and renders the report.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the plan is malformed or it
/// contains an unsupported action.
pub fn build_report(config: &ReportConfig, run: Option<&RunInfo>) -> Result<BuiltReport> {
    let plan_text = config.read_plan_text()?;
    let document = PlanParser::new().load_file(&config.json_path)?;

    if let Some(version) = &document.terraform_version {
        debug!("Plan produced by Terraform {version}");
    }

    let plan = Summarizer::new().summarize(&document)?;
    let body = ReportRenderer::new(config.render_options()).render(&plan, &plan_text, run);

    Ok(BuiltReport { plan, body })
}

impl<'a> ReportRunner<'a> {
    /// Creates a new runner.
    #[must_use]
    pub fn new(
        config: &'a ReportConfig,
        context: &'a GitHubContext,
        publisher: Arc<dyn CommentPublisher>,
    ) -> Self {
        Self {
            config,
            context,
            publisher,
        }
    }

    /// Performs the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the event has no pull request, the report cannot
    /// be built, or the comment cannot be created. Failing to remove a stale
    /// report is only logged.
    pub async fn run(&self) -> Result<RunOutcome> {
        let pull_request = self.context.require_pull_request()?;

        if !pull_request.is_open() {
            warn!(
                "Action triggered on a closed pull request (#{}), not posting a report",
                pull_request.number
            );
            return Ok(RunOutcome::SkippedClosed {
                number: pull_request.number,
            });
        }

        info!(
            "Building report for {}/{}#{}",
            self.context.owner, self.context.repo, pull_request.number
        );

        let run = self.context.run_info();
        let report = build_report(self.config, Some(&run))?;

        let cleanup = if self.config.remove_stale_reports {
            self.remove_stale_reports(pull_request.number, &run.marker).await
        } else {
            Cleanup::default()
        };

        let comment = self
            .publisher
            .create_comment(pull_request.number, &report.body)
            .await?;

        info!(
            "Posted report {} ({})",
            comment.id,
            comment.html_url.as_deref().unwrap_or("no url")
        );

        Ok(RunOutcome::Posted {
            comment_id: comment.id,
            html_url: comment.html_url,
            removed: cleanup.removed,
            failed_removals: cleanup.failed,
        })
    }

    /// Deletes reports from earlier runs concurrently. Never fails.
    async fn remove_stale_reports(&self, issue_number: u64, current: &ReportMarker) -> Cleanup {
        let comments = match self.publisher.list_comments(issue_number).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!("Could not list comments, skipping stale report cleanup: {e}");
                return Cleanup::default();
            }
        };

        let author = self.config.report_author.as_deref();
        let stale: Vec<u64> = stale_reports(&comments, current, author)
            .iter()
            .map(|c| c.id)
            .collect();
        debug!(
            "Found {} stale reports among {} comments",
            stale.len(),
            comments.len()
        );

        let mut tasks = JoinSet::new();
        for comment_id in stale {
            let publisher = Arc::clone(&self.publisher);
            tasks.spawn(async move { (comment_id, publisher.delete_comment(comment_id).await) });
        }

        let mut cleanup = Cleanup::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((comment_id, Ok(()))) => {
                    debug!("Removed stale report {comment_id}");
                    cleanup.removed += 1;
                }
                Ok((comment_id, Err(e))) => {
                    warn!("Could not delete comment {comment_id}: {e}");
                    cleanup.failed += 1;
                }
                Err(e) => {
                    warn!("Comment deletion task failed: {e}");
                    cleanup.failed += 1;
                }
            }
        }

        if cleanup.removed > 0 {
            info!("Removed {} stale reports", cleanup.removed);
        }
        cleanup
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Posted {
                comment_id,
                html_url,
                removed,
                failed_removals,
            } => {
                write!(f, "Posted report {comment_id}")?;
                if let Some(url) = html_url {
                    write!(f, " ({url})")?;
                }
                if *removed > 0 || *failed_removals > 0 {
                    write!(f, ", removed {removed} stale reports")?;
                }
                if *failed_removals > 0 {
                    write!(f, " ({failed_removals} could not be removed)")?;
                }
                Ok(())
            }
            Self::SkippedClosed { number } => {
                write!(f, "Pull request #{number} is closed, no report posted")
            }
        }
    }
}
