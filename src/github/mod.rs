//! GitHub integration module.
//!
//! This module provides the REST client used to list, delete and create
//! pull request comments, behind the `CommentPublisher` trait.

mod client;
mod publisher;
mod types;

pub use client::GitHubClient;
#[cfg(test)]
pub use publisher::MockCommentPublisher;
pub use publisher::{CommentPublisher, stale_reports};
pub use types::{Comment, CommentUser};
