//! Configuration module for the report tool.
//!
//! This module handles everything a run is configured by:
//! - Action inputs (flags or `INPUT_*` variables) validated into `ReportConfig`
//! - The GitHub Actions workflow context (repository, run, pull request)

mod context;
mod settings;

pub use context::{DEFAULT_API_URL, DEFAULT_SERVER_URL, GitHubContext, PullRequestRef};
pub use settings::{
    DEFAULT_TIMEOUT_SECS, GITHUB_TOKEN, REMOVE_STALE_REPORTS, REPORT_AUTHOR, ReportConfig, ReportInputs,
    SHOW_DIFF, SHOW_PLAN, TERRAFORM_JSON, TERRAFORM_TEXT, TIMEOUT_SECS, load_dotenv,
    parse_bool_input,
};
