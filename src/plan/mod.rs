//! Plan model module.
//!
//! This module turns the JSON document produced by `terraform show -json`
//! into a typed, validated representation:
//! - Typed resource change records (`PlannedChange`)
//! - Up-front structural validation (`PlanParser`)
//! - Attribute path flattening shared with the summarizer

mod flatten;
mod model;
mod parser;

pub use flatten::{flatten_attributes, has_marked_ancestor, is_marked, marked_paths};
pub use model::{Action, PlanDocument, PlannedChange};
pub use parser::PlanParser;
