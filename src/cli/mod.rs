//! CLI module for the report tool.
//!
//! This module provides the command-line interface for publishing,
//! rendering and summarizing Terraform plan reports.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{Annotation, OutputFormatter, annotate, workflow_command, write_stdout};
