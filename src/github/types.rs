//! GitHub API types.
//!
//! Only the fields this tool reads are modelled; everything else in the
//! responses is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An issue (or pull request) comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID.
    pub id: u64,
    /// Markdown body.
    #[serde(default)]
    pub body: Option<String>,
    /// Web URL of the comment.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Author of the comment.
    #[serde(default)]
    pub user: Option<CommentUser>,
    /// When the comment was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentUser {
    /// Login name.
    pub login: String,
    /// Account type (`User`, `Bot`, ...).
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}

/// Body of a create-comment request.
#[derive(Debug, Serialize)]
pub(crate) struct CreateCommentRequest<'a> {
    pub body: &'a str,
}

impl Comment {
    /// Returns the body, or an empty string if there is none.
    #[must_use]
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Returns true if the comment was written by `login`, or by a bot
    /// account when no login is given.
    #[must_use]
    pub fn is_authored_by(&self, login: Option<&str>) -> bool {
        self.user.as_ref().is_some_and(|user| match login {
            Some(login) => user.login.eq_ignore_ascii_case(login),
            None => user.is_bot(),
        })
    }
}

impl CommentUser {
    /// Returns true for bot accounts such as `github-actions[bot]`.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.user_type.as_deref() == Some("Bot")
    }
}
