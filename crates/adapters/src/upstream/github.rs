// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! GitHub pull request comment adapter.
//!
//! Keeps exactly one managed comment per pull request. The managed comment is
//! recognised by the [`COMMENT_SENTINEL`] marker on its first line; posting a
//! new report edits it in place instead of adding another comment.

use async_trait::async_trait;
use perfwatch_core::store::{is_managed_comment, managed_comment_body};
use perfwatch_core::{CommentPoster, PullRequest, COMMENT_SENTINEL};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

/// Default GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Comments requested per listing page (GitHub maximum).
const PER_PAGE: usize = 100;

/// Errors that can occur talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status
    #[error("GitHub returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Repository identity is not `owner/name`
    #[error("Invalid repository identity '{0}', expected owner/name")]
    InvalidRepository(String),

    /// Token contains characters not allowed in a header
    #[error("Invalid GitHub token")]
    InvalidToken,
}

/// Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, GithubError>;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentChange {
    /// A new comment with this id was created.
    Created(u64),
    /// The existing comment with this id was updated.
    Updated(u64),
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// Comment poster for GitHub issues and pull requests.
#[derive(Clone)]
pub struct GithubCommentPoster {
    http: Client,
    api_url: String,
}

impl std::fmt::Debug for GithubCommentPoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubCommentPoster")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl GithubCommentPoster {
    /// Create a poster authenticated with a token.
    pub fn new(token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| GithubError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let http = Client::builder()
            .user_agent(concat!("perfwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Override the API root (GitHub Enterprise, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn repo_url(&self, repository: &str) -> Result<String> {
        let mut parts = repository.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(
                format!("{}/repos/{}/{}", self.api_url.trim_end_matches('/'), owner, name),
            ),
            _ => Err(GithubError::InvalidRepository(repository.to_string())),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiMessage>(&text)
            .map(|m| m.message)
            .unwrap_or(text);
        Err(GithubError::Status { status, message })
    }

    /// Id of the managed comment on a pull request, if any.
    pub async fn find_managed_comment(&self, pull_request: &PullRequest) -> Result<Option<u64>> {
        let url = format!(
            "{}/issues/{}/comments",
            self.repo_url(&pull_request.repository)?,
            pull_request.id
        );
        let per_page = PER_PAGE.to_string();

        for page in 1usize.. {
            let page_number = page.to_string();
            let response = self
                .http
                .get(&url)
                .query(&[("per_page", per_page.as_str()), ("page", page_number.as_str())])
                .send()
                .await?;
            let comments: Vec<IssueComment> = Self::check(response).await?.json().await?;
            debug!(page, comments = comments.len(), "Listed pull request comments");

            if let Some(found) = comments
                .iter()
                .find(|c| c.body.as_deref().is_some_and(is_managed_comment))
            {
                return Ok(Some(found.id));
            }
            if comments.len() < PER_PAGE {
                break;
            }
        }
        Ok(None)
    }

    /// Replace the managed comment's body or create it.
    pub async fn upsert(&self, pull_request: &PullRequest, report: &str) -> Result<CommentChange> {
        let repo_url = self.repo_url(&pull_request.repository)?;
        let body = json!({ "body": managed_comment_body(report) });

        match self.find_managed_comment(pull_request).await? {
            Some(id) => {
                let response = self
                    .http
                    .patch(format!("{}/issues/comments/{}", repo_url, id))
                    .json(&body)
                    .send()
                    .await?;
                Self::check(response).await?;
                Ok(CommentChange::Updated(id))
            }
            None => {
                let response = self
                    .http
                    .post(format!("{}/issues/{}/comments", repo_url, pull_request.id))
                    .json(&body)
                    .send()
                    .await?;
                let created: IssueComment = Self::check(response).await?.json().await?;
                Ok(CommentChange::Created(created.id))
            }
        }
    }
}

#[async_trait]
impl CommentPoster for GithubCommentPoster {
    async fn upsert_comment(
        &self,
        pull_request: &PullRequest,
        report: &str,
    ) -> perfwatch_core::Result<()> {
        let change = self
            .upsert(pull_request, report)
            .await
            .map_err(|e| perfwatch_core::Error::comment_post(e.to_string()))?;
        info!(
            repository = %pull_request.repository,
            pull_request = %pull_request.id,
            change = ?change,
            sentinel = COMMENT_SENTINEL,
            "GitHub comment written"
        );
        Ok(())
    }
}
