// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! External collaborator interfaces.
//!
//! The pipeline only talks to remote systems through these two traits, so
//! tests can substitute the in-memory implementations from [`crate::memory`].

use crate::context::PullRequest;
use crate::measurement::{BaselineSet, Measurement};
use crate::Result;
use async_trait::async_trait;

/// Invisible marker identifying the managed pull request comment.
pub const COMMENT_SENTINEL: &str = "<!-- _METRICS_ -->";

/// Prefix a rendered report with the sentinel marker.
pub fn managed_comment_body(report: &str) -> String {
    format!("{}\n{}", COMMENT_SENTINEL, report)
}

/// Whether a comment body belongs to the managed comment.
pub fn is_managed_comment(body: &str) -> bool {
    body.contains(COMMENT_SENTINEL)
}

/// Append-only history of measurements, scoped by repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Most recent stored measurement for every command ever recorded for
    /// the repository. Empty when the repository has no history.
    ///
    /// Failures map to [`crate::Error::BaselineFetch`].
    async fn fetch_latest(&self, repository: &str) -> Result<BaselineSet>;

    /// Store measurements as the newest history entries of the repository.
    ///
    /// Failures map to [`crate::Error::Persistence`].
    async fn append(&self, repository: &str, measurements: &[Measurement]) -> Result<()>;
}

/// Posts the report on a pull request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentPoster: Send + Sync {
    /// Replace the body of the managed comment on the pull request, or
    /// create it when none exists. `report` is the rendered markdown without
    /// the sentinel.
    ///
    /// Failures map to [`crate::Error::CommentPost`].
    async fn upsert_comment(&self, pull_request: &PullRequest, report: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_comment_body_starts_with_sentinel() {
        let body = managed_comment_body("| a |");
        assert_eq!(body, "<!-- _METRICS_ -->\n| a |");
        assert!(is_managed_comment(&body));
        assert!(!is_managed_comment("| a |"));
    }
}
