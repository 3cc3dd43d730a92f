//! Report inputs and run configuration.
//!
//! Inputs arrive either as command-line flags or, inside GitHub Actions, as
//! `INPUT_<NAME>` environment variables (the hyphen in the input name is
//! kept). They are validated once into an immutable [`ReportConfig`].

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, ReportError, Result};
use crate::report::RenderOptions;

/// Input name of the textual plan path.
pub const TERRAFORM_TEXT: &str = "terraform-text";
/// Input name of the JSON plan path.
pub const TERRAFORM_JSON: &str = "terraform-json";
/// Input name of the GitHub token.
pub const GITHUB_TOKEN: &str = "github-token";
/// Input name of the show-plan flag.
pub const SHOW_PLAN: &str = "show-plan";
/// Input name of the show-diff flag.
pub const SHOW_DIFF: &str = "show-diff";
/// Input name of the stale report cleanup flag.
pub const REMOVE_STALE_REPORTS: &str = "remove-stale-reports";
/// Input name of the login whose earlier reports may be removed.
pub const REPORT_AUTHOR: &str = "report-author";
/// Input name of the per-request timeout.
pub const TIMEOUT_SECS: &str = "timeout-secs";

/// Default timeout for each GitHub API request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw, unvalidated inputs.
///
/// Values are strings because GitHub Actions passes every input as one;
/// empty strings count as absent.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportInputs {
    /// Path to the textual plan (`terraform show`).
    #[arg(long = "terraform-text", env = "INPUT_TERRAFORM-TEXT", global = true)]
    pub terraform_text: Option<String>,

    /// Path to the JSON plan (`terraform show -json`).
    #[arg(long = "terraform-json", env = "INPUT_TERRAFORM-JSON", global = true)]
    pub terraform_json: Option<String>,

    /// Token used to call the GitHub API.
    #[arg(long = "github-token", env = "INPUT_GITHUB-TOKEN", global = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// Include the raw plan text in the report (`true`/`false`).
    #[arg(long = "show-plan", env = "INPUT_SHOW-PLAN", global = true)]
    pub show_plan: Option<String>,

    /// Include the per-resource diff in the report (`true`/`false`).
    #[arg(long = "show-diff", env = "INPUT_SHOW-DIFF", global = true)]
    pub show_diff: Option<String>,

    /// Delete reports left by earlier runs (`true`/`false`).
    #[arg(long = "remove-stale-reports", env = "INPUT_REMOVE-STALE-REPORTS", global = true)]
    pub remove_stale_reports: Option<String>,

    /// Login that posts reports; earlier reports by other authors are kept.
    /// Defaults to any bot account.
    #[arg(long = "report-author", env = "INPUT_REPORT-AUTHOR", global = true)]
    pub report_author: Option<String>,

    /// Timeout for each GitHub API request, in seconds.
    #[arg(long = "timeout-secs", env = "INPUT_TIMEOUT-SECS", global = true)]
    pub timeout_secs: Option<String>,
}

/// Validated configuration for one run. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Path to the textual plan.
    pub text_path: PathBuf,
    /// Path to the JSON plan.
    pub json_path: PathBuf,
    /// GitHub token, present when publishing.
    pub token: Option<String>,
    /// Include the raw plan text.
    pub show_plan: bool,
    /// Include the per-resource diff.
    pub show_diff: bool,
    /// Delete reports left by earlier runs.
    pub remove_stale_reports: bool,
    /// Author of earlier reports; `None` means any bot account.
    pub report_author: Option<String>,
    /// Timeout for each GitHub API request.
    pub timeout: Duration,
}

impl ReportInputs {
    /// Returns the JSON plan path on its own, for commands that only
    /// summarize the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is missing.
    pub fn json_path(&self) -> Result<PathBuf> {
        present(self.terraform_json.as_deref())
            .map(PathBuf::from)
            .ok_or_else(|| missing_inputs(&[TERRAFORM_JSON]))
    }
}

impl ReportConfig {
    /// Validates raw inputs.
    ///
    /// Every missing required input is named in the error, not just the first.
    ///
    /// # Errors
    ///
    /// Returns an error if a required input is missing or a value is invalid.
    pub fn from_inputs(inputs: &ReportInputs, require_token: bool) -> Result<Self> {
        let text = present(inputs.terraform_text.as_deref());
        let json = present(inputs.terraform_json.as_deref());
        let token = present(inputs.github_token.as_deref());

        let mut missing = Vec::new();
        if text.is_none() {
            missing.push(TERRAFORM_TEXT);
        }
        if json.is_none() {
            missing.push(TERRAFORM_JSON);
        }
        if require_token && token.is_none() {
            missing.push(GITHUB_TOKEN);
        }

        let (Some(text), Some(json)) = (text, json) else {
            return Err(missing_inputs(&missing));
        };
        if !missing.is_empty() {
            return Err(missing_inputs(&missing));
        }

        let timeout_secs = match present(inputs.timeout_secs.as_deref()) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::invalid_input(
                        TIMEOUT_SECS,
                        format!("expected a positive number of seconds, got '{raw}'"),
                    )
                    .into());
                }
            },
        };

        let config = Self {
            text_path: PathBuf::from(text),
            json_path: PathBuf::from(json),
            token: token.map(String::from),
            show_plan: parse_bool_input(SHOW_PLAN, inputs.show_plan.as_deref())?,
            show_diff: parse_bool_input(SHOW_DIFF, inputs.show_diff.as_deref())?,
            remove_stale_reports: parse_bool_input(
                REMOVE_STALE_REPORTS,
                inputs.remove_stale_reports.as_deref(),
            )?,
            report_author: present(inputs.report_author.as_deref()).map(String::from),
            timeout: Duration::from_secs(timeout_secs),
        };

        debug!(
            "Report config: show_plan={}, show_diff={}, remove_stale_reports={}, timeout={}s",
            config.show_plan, config.show_diff, config.remove_stale_reports, timeout_secs
        );

        Ok(config)
    }

    /// Returns the renderer options for this run.
    #[must_use]
    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_plan: self.show_plan,
            show_diff: self.show_diff,
        }
    }

    /// Returns the GitHub token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token was provided.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| missing_inputs(&[GITHUB_TOKEN]))
    }

    /// Reads the textual plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn read_plan_text(&self) -> Result<String> {
        let path = &self.text_path;
        info!("Loading plan text from: {}", path.display());

        if !path.exists() {
            return Err(ReportError::Config(ConfigError::FileNotFound { path: path.clone() }));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Parses a boolean action input.
///
/// Accepts `true`/`false` in any case; absent or empty means `false`.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn parse_bool_input(name: &str, raw: Option<&str>) -> Result<bool> {
    match present(raw) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(ConfigError::invalid_input(
            name,
            format!("expected 'true' or 'false', got '{value}'"),
        )
        .into()),
    }
}

/// Loads the .env file from `base` if present.
///
/// # Errors
///
/// Returns an error if the .env file exists but cannot be loaded.
pub fn load_dotenv(base: impl AsRef<Path>) -> Result<()> {
    let env_path = base.as_ref().join(".env");

    if env_path.exists() {
        info!("Loading environment from: {}", env_path.display());
        dotenvy::from_path(&env_path).map_err(|e| {
            ConfigError::invalid_input(".env", format!("failed to load {}: {e}", env_path.display()))
        })?;
    } else {
        debug!(".env file not found at: {}", env_path.display());
    }

    Ok(())
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn missing_inputs(names: &[&str]) -> ReportError {
    ReportError::Config(ConfigError::MissingInput {
        name: names.join(", "),
    })
}
