//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};

use crate::config::ReportInputs;

/// Terraform Report - posts Terraform plan summaries on pull requests.
#[derive(Parser, Debug)]
#[command(name = "terraform-report")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Report inputs.
    #[command(flatten)]
    pub inputs: ReportInputs,

    /// Subcommand to execute (defaults to `publish`).
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Post the report on the pull request that triggered the workflow.
    Publish,

    /// Print the markdown report to stdout without calling GitHub.
    Render,

    /// Print the change summary.
    Summary,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

impl Cli {
    /// Returns the command to run.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Publish)
    }
}

impl Commands {
    /// Returns true if the command talks to the GitHub API.
    #[must_use]
    pub const fn needs_token(self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
