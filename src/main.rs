//! Terraform report CLI entrypoint.
//!
//! This is the main entrypoint for the terraform-report command-line tool.

use std::process::ExitCode;
use std::sync::Arc;

use terraform_plan_report::cli::{
    Annotation, Cli, Commands, OutputFormatter, annotate, write_stdout,
};
use terraform_plan_report::config::{GitHubContext, ReportConfig, load_dotenv};
use terraform_plan_report::error::Result;
use terraform_plan_report::github::GitHubClient;
use terraform_plan_report::plan::PlanParser;
use terraform_plan_report::reporter::{ReportRunner, RunOutcome, build_report};
use terraform_plan_report::summarizer::Summarizer;

use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // Local runs pick inputs up from .env before clap reads the environment.
    let dotenv = load_dotenv(".");

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = dotenv {
        warn!("{e}");
    }

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            annotate(Annotation::Error, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let command = cli.command();
    debug!("Running {command:?} with {} output", cli.output);

    match command {
        Commands::Publish => cmd_publish(&cli, &formatter).await,
        Commands::Render => cmd_render(&cli),
        Commands::Summary => cmd_summary(&cli, &formatter),
    }
}

/// Post the report on the triggering pull request.
async fn cmd_publish(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let config = ReportConfig::from_inputs(&cli.inputs, Commands::Publish.needs_token())?;
    let context = GitHubContext::from_env()?;

    let client = GitHubClient::from_context(&context, config.require_token()?, config.timeout)?;
    let runner = ReportRunner::new(&config, &context, Arc::new(client));

    let outcome = runner.run().await?;
    if let RunOutcome::SkippedClosed { number } = &outcome {
        annotate(
            Annotation::Warning,
            &format!("Pull request #{number} is closed, no report posted"),
        );
    }

    eprint!("{}", formatter.format_outcome(&outcome));
    Ok(())
}

/// Print the markdown report.
fn cmd_render(cli: &Cli) -> Result<()> {
    let config = ReportConfig::from_inputs(&cli.inputs, false)?;
    let report = build_report(&config, None)?;
    write_stdout(&report.body)
}

/// Print the change summary.
fn cmd_summary(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let json_path = cli.inputs.json_path()?;
    let document = PlanParser::new().load_file(&json_path)?;
    let plan = Summarizer::new().summarize(&document)?;
    write_stdout(&formatter.format_summary(&plan))
}
