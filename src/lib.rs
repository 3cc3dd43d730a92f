// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Terraform Plan Report
//!
//! Posts a human-readable summary of a Terraform plan as a comment on the
//! pull request that triggered a GitHub Actions workflow.
//!
//! ## Overview
//!
//! Given the JSON plan (`terraform show -json`) and its textual rendering
//! (`terraform show`), a run:
//!
//! - Validates the plan and classifies every resource change
//! - Counts resources to add, change, destroy and replace
//! - Renders a unified-diff-style fragment per affected resource
//! - Posts one markdown comment and removes reports left by earlier runs
//!
//! ## Architecture
//!
//! The pipeline is a straight line:
//!
//! 1. **Plan Model**: `terraform show -json` output parsed and validated
//! 2. **Summarizer**: counts and diff fragments, in plan order
//! 3. **Renderer**: markdown comment with a hidden run marker
//! 4. **Publisher**: GitHub REST API comment cleanup and creation
//!
//! ## Modules
//!
//! - [`config`]: Action inputs and workflow context
//! - [`plan`]: Plan model and parser
//! - [`summarizer`]: Change classification and diff fragments
//! - [`report`]: Markdown rendering and report markers
//! - [`github`]: GitHub API client
//! - [`reporter`]: End-to-end run
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! - run: terraform show -no-color tfplan > plan.txt
//! - run: terraform show -json tfplan > plan.json
//! - run: terraform-report
//!   env:
//!     INPUT_TERRAFORM-TEXT: plan.txt
//!     INPUT_TERRAFORM-JSON: plan.json
//!     INPUT_GITHUB-TOKEN: ${{ secrets.GITHUB_TOKEN }}
//!     INPUT_SHOW-DIFF: "true"
//!     INPUT_REMOVE-STALE-REPORTS: "true"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod plan;
pub mod report;
pub mod reporter;
pub mod summarizer;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{GitHubContext, ReportConfig, ReportInputs};
pub use error::{ReportError, Result};
pub use github::{CommentPublisher, GitHubClient};
pub use plan::{PlanDocument, PlanParser, PlannedChange};
pub use report::{ReportMarker, ReportRenderer};
pub use reporter::{ReportRunner, RunOutcome, build_report};
pub use summarizer::{PlanSummary, Summarizer, Summary};
