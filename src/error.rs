//! Error types for the Terraform plan report.
//!
//! This module provides the error hierarchy for every stage of a report run:
//! input configuration, plan parsing and summarizing, and publishing to GitHub.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the report tool.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan parsing and summarizing errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// GitHub API errors.
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required input was not provided.
    #[error("Missing required input: {name}")]
    MissingInput {
        /// Name of the missing input.
        name: String,
    },

    /// An input was provided with a value that cannot be used.
    #[error("Invalid value for input {name}: {message}")]
    InvalidInput {
        /// Name of the input.
        name: String,
        /// Why the value was rejected.
        message: String,
    },

    /// An input file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// The workflow context could not be read.
    #[error("Invalid workflow context: {message}")]
    InvalidContext {
        /// Description of the problem.
        message: String,
    },

    /// The triggering event does not carry a pull request.
    #[error("Triggering event is not a pull request event: {event_name}")]
    NotPullRequest {
        /// Name of the event, if known.
        event_name: String,
    },
}

/// Plan parsing and summarizing errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan document does not have the expected structure.
    #[error("Malformed plan: {message}")]
    Malformed {
        /// Description of the first structural violation.
        message: String,
        /// Where in the document the violation was found.
        location: Option<String>,
    },

    /// Two resource changes share the same address.
    #[error("Malformed plan: duplicate resource address {address}")]
    DuplicateAddress {
        /// The duplicated address.
        address: String,
    },

    /// A resource change carries an action this tool does not understand.
    #[error("Unsupported action '{action}' for resource {address}")]
    UnsupportedAction {
        /// Address of the resource.
        address: String,
        /// The raw action value.
        action: String,
    },
}

/// GitHub API errors.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Authentication failed.
    #[error("GitHub authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("GitHub API request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },

    /// Rate limited.
    #[error("GitHub API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with GitHub: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("GitHub API request timed out after {timeout_secs} seconds")]
    Timeout {
        /// Timeout that elapsed.
        timeout_secs: u64,
    },

    /// Invalid response from API.
    #[error("Invalid response from GitHub API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Publish(
                PublishError::RateLimited { .. }
                | PublishError::NetworkError { .. }
                | PublishError::Timeout { .. },
            ) => true,
            Self::Publish(PublishError::ApiRequestFailed { status, .. }) => *status >= 500,
            _ => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Publish(PublishError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            Self::Publish(PublishError::NetworkError { .. } | PublishError::Timeout { .. }) => {
                Some(1)
            }
            Self::Publish(PublishError::ApiRequestFailed { status, .. }) if *status >= 500 => {
                Some(1)
            }
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid context error.
    #[must_use]
    pub fn context(message: impl Into<String>) -> Self {
        Self::InvalidContext {
            message: message.into(),
        }
    }
}

impl PlanError {
    /// Creates a malformed plan error at the given location.
    #[must_use]
    pub fn malformed(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Creates a malformed plan error without a location.
    #[must_use]
    pub fn malformed_general(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            location: None,
        }
    }
}

impl PublishError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ReportError::from(PublishError::network("reset")).is_retryable());
        assert!(ReportError::from(PublishError::Timeout { timeout_secs: 30 }).is_retryable());
        assert!(ReportError::from(PublishError::api_error(502, "bad gateway")).is_retryable());
        assert!(!ReportError::from(PublishError::api_error(422, "invalid")).is_retryable());
        assert!(
            !ReportError::from(PlanError::UnsupportedAction {
                address: String::from("a.b"),
                action: String::from("archive"),
            })
            .is_retryable()
        );
    }

    #[test]
    fn test_rate_limit_delay() {
        let err = ReportError::from(PublishError::RateLimited { retry_after_secs: 7 });
        assert_eq!(err.retry_delay_secs(), Some(7));
        assert_eq!(
            ReportError::from(PublishError::api_error(404, "missing")).retry_delay_secs(),
            None
        );
    }

    #[test]
    fn test_unsupported_action_message() {
        let err = PlanError::UnsupportedAction {
            address: String::from("aws_s3_bucket.logs"),
            action: String::from("archive"),
        };
        let message = err.to_string();
        assert!(message.contains("archive"));
        assert!(message.contains("aws_s3_bucket.logs"));
    }
}
