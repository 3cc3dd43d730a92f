//! GitHub REST API client implementation.
//!
//! Endpoints used:
//!   * GET    /repos/{owner}/{repo}/issues/{number}/comments
//!   * POST   /repos/{owner}/{repo}/issues/{number}/comments
//!   * DELETE /repos/{owner}/{repo}/issues/comments/{comment_id}

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::config::GitHubContext;
use crate::error::{PublishError, ReportError, Result};

use super::publisher::CommentPublisher;
use super::types::{Comment, CreateCommentRequest};

/// REST API version requested from GitHub.
const API_VERSION: &str = "2022-11-28";

/// Page size used when listing comments.
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched when listing comments.
const MAX_PAGES: u32 = 50;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Longest rate-limit wait honored before retrying, in seconds.
const MAX_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// GitHub API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// HTTP client.
    client: Client,
    /// REST API base URL.
    api_url: String,
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// API token.
    token: String,
    /// Per-request timeout.
    timeout: Duration,
    /// Base delay between retries.
    retry_delay: Duration,
}

impl GitHubClient {
    /// Creates a new client for a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("terraform-report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
            timeout,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Creates a client for the repository of a workflow run.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_context(context: &GitHubContext, token: &str, timeout: Duration) -> Result<Self> {
        Self::new(&context.api_url, &context.owner, &context.repo, token, timeout)
    }

    /// Sets the base delay between retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{path}", self.api_url, self.owner, self.repo)
    }

    /// Executes a request, retrying transient failures, and returns the body.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = match last_error.as_ref().and_then(ReportError::retry_delay_secs) {
                    Some(secs) if secs > 1 => {
                        Duration::from_secs(secs.min(MAX_RATE_LIMIT_WAIT_SECS))
                    }
                    _ => self.retry_delay * attempt,
                };
                debug!("Retry attempt {attempt} of {MAX_RETRIES} in {delay:?}");
                tokio::time::sleep(delay).await;
            }

            match self.execute_once(method.clone(), url, body).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if e.is_retryable() {
                        debug!("Transient GitHub API failure: {e}");
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ReportError::Publish(PublishError::NetworkError {
                message: String::from("Max retries exceeded"),
            })
        }))
    }

    /// Executes a single request.
    async fn execute_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        trace!("GitHub API {method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ReportError::Publish(PublishError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            } else {
                ReportError::Publish(PublishError::NetworkError {
                    message: format!("Request failed: {e}"),
                })
            }
        })?;

        let status = response.status();
        let header_secs = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
        };

        let rate_limited = status.as_u16() == 429
            || (status.as_u16() == 403 && header_secs("x-ratelimit-remaining") == Some(0));
        if rate_limited {
            let retry_after = header_secs("retry-after").unwrap_or(0);
            let retry_after = if retry_after == 0 { 60 } else { retry_after };

            return Err(ReportError::Publish(PublishError::RateLimited {
                retry_after_secs: retry_after,
            }));
        }

        if status.as_u16() == 401 {
            return Err(ReportError::Publish(PublishError::AuthenticationFailed {
                message: String::from("Bad credentials"),
            }));
        }

        let text = response.text().await.map_err(|e| {
            ReportError::Publish(PublishError::InvalidResponse {
                message: format!("Failed to read response: {e}"),
            })
        })?;

        if !status.is_success() {
            return Err(ReportError::Publish(PublishError::api_error(
                status.as_u16(),
                api_message(&text),
            )));
        }

        Ok(text)
    }

    /// Executes a request and decodes the JSON response.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let text = self.execute(method, url, body).await?;
        serde_json::from_str(&text).map_err(|e| {
            ReportError::Publish(PublishError::InvalidResponse {
                message: format!("Failed to parse response: {e}"),
            })
        })
    }
}

#[async_trait]
impl CommentPublisher for GitHubClient {
    async fn list_comments(&self, issue_number: u64) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = self.repo_url(&format!(
                "issues/{issue_number}/comments?per_page={PER_PAGE}&page={page}"
            ));
            let batch: Vec<Comment> = self.execute_json(Method::GET, &url, None).await?;
            let last = batch.len() < PER_PAGE;
            comments.extend(batch);
            if last {
                break;
            }
        }

        debug!("Listed {} comments on #{issue_number}", comments.len());
        Ok(comments)
    }

    async fn delete_comment(&self, comment_id: u64) -> Result<()> {
        let url = self.repo_url(&format!("issues/comments/{comment_id}"));
        self.execute(Method::DELETE, &url, None).await?;

        debug!("Deleted comment {comment_id}");
        Ok(())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<Comment> {
        let url = self.repo_url(&format!("issues/{issue_number}/comments"));
        let payload = serde_json::to_value(CreateCommentRequest { body }).map_err(|e| {
            ReportError::internal(format!("Failed to encode comment: {e}"))
        })?;

        let comment: Comment = self.execute_json(Method::POST, &url, Some(&payload)).await?;

        info!("Created comment {} on #{issue_number}", comment.id);
        Ok(comment)
    }
}

/// Extracts the `message` field of a GitHub error body, if present.
fn api_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&server.uri(), "octo", "infra", "t0ken", Duration::from_secs(5))
            .expect("client should build")
            .with_retry_delay(Duration::from_millis(10))
    }

    fn comment_json(id: u64, body: &str) -> serde_json::Value {
        json!({
            "id": id,
            "body": body,
            "html_url": format!("https://github.com/octo/infra/pull/7#issuecomment-{id}"),
            "user": { "login": "github-actions[bot]", "type": "Bot" },
            "created_at": "2024-05-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_comments_follows_pages() {
        let server = MockServer::start().await;
        let full_page: Vec<serde_json::Value> =
            (1..=100).map(|id| comment_json(id, "first page")).collect();

        Mock::given(method("GET"))
            .and(path("/repos/octo/infra/issues/7/comments"))
            .and(query_param("page", "1"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/infra/issues/7/comments"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([comment_json(101, "last")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let comments = client(&server).list_comments(7).await.expect("list should succeed");

        assert_eq!(comments.len(), 101);
        assert_eq!(comments[100].body_text(), "last");
        assert!(comments[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_create_comment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/octo/infra/issues/7/comments"))
            .and(body_json(json!({ "body": "hello" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment_json(55, "hello")))
            .expect(1)
            .mount(&server)
            .await;

        let comment = client(&server)
            .create_comment(7, "hello")
            .await
            .expect("create should succeed");

        assert_eq!(comment.id, 55);
        assert_eq!(comment.user.map(|u| u.login).as_deref(), Some("github-actions[bot]"));
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/octo/infra/issues/comments/55"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete_comment(55).await.expect("delete should succeed");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/octo/infra/issues/comments/9"))
            .respond_with(ResponseTemplate::new(502))
            .expect(u64::from(MAX_RETRIES))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_comment(9)
            .await
            .expect_err("delete should fail after retries");

        assert!(matches!(
            err,
            ReportError::Publish(PublishError::ApiRequestFailed { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/octo/infra/issues/7/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                json!({ "message": "Resource not accessible by integration" }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .create_comment(7, "body")
            .await
            .expect_err("create should fail");

        match err {
            ReportError::Publish(PublishError::ApiRequestFailed { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Resource not accessible by integration");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).list_comments(1).await.expect_err("list should fail");
        assert!(matches!(
            err,
            ReportError::Publish(PublishError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri(), "octo", "infra", "t", Duration::from_millis(50))
            .expect("client should build")
            .with_retry_delay(Duration::from_millis(1));

        let err = client.create_comment(7, "x").await.expect_err("request should time out");
        assert!(matches!(err, ReportError::Publish(PublishError::Timeout { .. })));
    }
}
