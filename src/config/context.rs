//! GitHub Actions workflow context.
//!
//! Reads the repository, run identity and triggering pull request from the
//! variables GitHub sets on every runner.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ReportError, Result};
use crate::report::{ReportMarker, RunInfo};

/// Default web URL of GitHub.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Default REST API URL of GitHub.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Context of the workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubContext {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Workflow run ID.
    pub run_id: u64,
    /// Attempt number of the run.
    pub run_attempt: Option<u64>,
    /// Commit the run was triggered for.
    pub sha: String,
    /// Web URL of the GitHub instance.
    pub server_url: String,
    /// REST API URL of the GitHub instance.
    pub api_url: String,
    /// Name of the triggering event.
    pub event_name: Option<String>,
    /// Pull request from the event payload, if any.
    pub pull_request: Option<PullRequestRef>,
}

/// Pull request fields the report needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestRef {
    /// Pull request number (also its issue number).
    pub number: u64,
    /// `open` or `closed`.
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestRef>,
}

impl GitHubContext {
    /// Reads the context from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid, or the
    /// event payload cannot be read.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the context through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid, or the
    /// event payload cannot be read.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                ReportError::Config(ConfigError::MissingEnvVar {
                    name: name.to_string(),
                })
            })
        };

        let repository = required("GITHUB_REPOSITORY")?;
        let (owner, repo) = split_repository(&repository)?;

        let run_id = parse_number("GITHUB_RUN_ID", &required("GITHUB_RUN_ID")?)?;
        let run_attempt = var("GITHUB_RUN_ATTEMPT")
            .map(|raw| parse_number("GITHUB_RUN_ATTEMPT", &raw))
            .transpose()?;

        let pull_request = match var("GITHUB_EVENT_PATH") {
            Some(path) => Self::load_event(Path::new(&path))?,
            None => None,
        };

        let context = Self {
            owner,
            repo,
            run_id,
            run_attempt,
            sha: required("GITHUB_SHA")?,
            server_url: var("GITHUB_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            event_name: var("GITHUB_EVENT_NAME"),
            pull_request,
        };

        debug!(
            "GitHub context: {}/{} run {} ({:?})",
            context.owner, context.repo, context.run_id, context.event_name
        );

        Ok(context)
    }

    /// Reads the pull request from an event payload file.
    fn load_event(path: &Path) -> Result<Option<PullRequestRef>> {
        debug!("Loading event payload from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::context(format!("failed to read event payload {}: {e}", path.display()))
        })?;
        let payload: EventPayload = serde_json::from_str(&content).map_err(|e| {
            ConfigError::context(format!("failed to parse event payload {}: {e}", path.display()))
        })?;

        Ok(payload.pull_request)
    }

    /// Returns the triggering pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not carry a pull request.
    pub fn require_pull_request(&self) -> Result<&PullRequestRef> {
        self.pull_request.as_ref().ok_or_else(|| {
            ReportError::Config(ConfigError::NotPullRequest {
                event_name: self
                    .event_name
                    .clone()
                    .unwrap_or_else(|| String::from("unknown")),
            })
        })
    }

    /// Returns the web URL of the workflow run.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.run_id
        )
    }

    /// Returns the run identity embedded in reports.
    #[must_use]
    pub fn run_info(&self) -> RunInfo {
        RunInfo {
            marker: ReportMarker::new(self.run_id, self.run_attempt, self.sha.clone()),
            run_url: self.run_url(),
        }
    }
}

impl PullRequestRef {
    /// Returns true if the pull request is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

fn split_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::context(format!(
            "GITHUB_REPOSITORY must be owner/repo, got '{repository}'"
        ))
        .into()),
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| {
        ConfigError::context(format!("{name} must be a number, got '{raw}'")).into()
    })
}
