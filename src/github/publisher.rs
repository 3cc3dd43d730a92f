//! Comment publisher trait definition.
//!
//! This module defines the narrow interface the report runner needs from a
//! code review platform, plus stale report detection on top of it.

use async_trait::async_trait;

use crate::error::Result;
use crate::report::ReportMarker;

use super::types::Comment;

/// Trait for posting and cleaning up pull request comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Lists every comment on an issue or pull request.
    async fn list_comments(&self, issue_number: u64) -> Result<Vec<Comment>>;

    /// Deletes a comment.
    async fn delete_comment(&self, comment_id: u64) -> Result<()>;

    /// Creates a comment on an issue or pull request.
    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<Comment>;
}

/// Returns the comments that are reports from a run other than `current`.
///
/// A comment counts as a report only if its first line is a report marker
/// and it was written by `author`, or by a bot account when `author` is
/// `None`.
#[must_use]
pub fn stale_reports<'a>(
    comments: &'a [Comment],
    current: &ReportMarker,
    author: Option<&str>,
) -> Vec<&'a Comment> {
    comments
        .iter()
        .filter(|c| c.is_authored_by(author) && current.is_stale(c.body_text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::CommentUser;

    fn authored(id: u64, body: &str, login: &str, user_type: &str) -> Comment {
        Comment {
            id,
            body: Some(body.to_string()),
            html_url: None,
            user: Some(CommentUser {
                login: login.to_string(),
                user_type: Some(user_type.to_string()),
            }),
            created_at: None,
        }
    }

    fn comment(id: u64, body: &str) -> Comment {
        authored(id, body, "github-actions[bot]", "Bot")
    }

    #[test]
    fn test_stale_reports() {
        let current = ReportMarker::new(10, None, "new");
        let previous = ReportMarker::new(9, None, "old");

        let comments = vec![
            comment(1, &format!("{}\n### :robot: Terraform Report", previous.to_comment())),
            comment(2, "### :robot: Terraform Report\nhand written"),
            comment(3, &format!("{}\n### :robot: Terraform Report", current.to_comment())),
            Comment {
                body: None,
                ..comment(4, "")
            },
        ];

        let stale: Vec<u64> = stale_reports(&comments, &current, None).iter().map(|c| c.id).collect();
        assert_eq!(stale, vec![1]);
    }

    #[test]
    fn test_stale_reports_only_from_the_report_author() {
        let current = ReportMarker::new(10, None, "new");
        let old = ReportMarker::new(9, None, "old").to_comment();

        let comments = vec![
            comment(1, &old),
            authored(2, &old, "octocat", "User"),
            authored(3, &old, "deploy-bot", "User"),
        ];

        let by_bot: Vec<u64> = stale_reports(&comments, &current, None).iter().map(|c| c.id).collect();
        assert_eq!(by_bot, vec![1]);

        let by_login: Vec<u64> = stale_reports(&comments, &current, Some("deploy-bot"))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(by_login, vec![3]);
    }
}
