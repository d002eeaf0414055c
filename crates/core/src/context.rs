// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! CI context resolution.
//!
//! The raw CI environment is read once at the process boundary into
//! [`EnvSignals`]. [`CiContext::resolve`] turns those signals into the single
//! classification every later stage branches on.

use serde::{Deserialize, Serialize};

/// Environment signals describing the current CI run.
///
/// Values are taken verbatim; empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSignals {
    /// Pull request identifier (`TRAVIS_PULL_REQUEST`).
    pub pull_request: Option<String>,
    /// Source branch of the pull request (`TRAVIS_PULL_REQUEST_BRANCH`).
    pub pull_request_branch: Option<String>,
    /// Base or direct branch (`TRAVIS_BRANCH`).
    pub branch: Option<String>,
    /// Repository identity carried by the pull request (`TRAVIS_PULL_REQUEST_SLUG`).
    pub pull_request_slug: Option<String>,
    /// Repository identity of the build (`TRAVIS_REPO_SLUG`).
    pub repository: Option<String>,
}

/// Identity of the pull request a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub id: String,
    /// Owning repository, `owner/name`.
    pub repository: String,
}

/// Classification of the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CiContext {
    /// A run not associated with any pull request.
    Direct {
        /// Branch being built.
        branch: String,
        /// Repository identity, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        repository: Option<String>,
    },
    /// A run triggered by an open pull request.
    PullRequest {
        /// Source branch of the pull request.
        branch: String,
        /// Pull request identity.
        pull_request: PullRequest,
    },
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CiContext {
    /// Classify a run from its environment signals.
    ///
    /// A non-empty pull request identifier other than `false` (the value
    /// Travis exports on push builds) makes this a pull-request context.
    pub fn resolve(signals: &EnvSignals) -> Self {
        let pull_request_id = present(&signals.pull_request).filter(|id| *id != "false");

        match pull_request_id {
            Some(id) => CiContext::PullRequest {
                branch: present(&signals.pull_request_branch)
                    .unwrap_or_default()
                    .to_string(),
                pull_request: PullRequest {
                    id: id.to_string(),
                    repository: present(&signals.pull_request_slug)
                        .or_else(|| present(&signals.repository))
                        .unwrap_or_default()
                        .to_string(),
                },
            },
            None => CiContext::Direct {
                branch: present(&signals.branch).unwrap_or_default().to_string(),
                repository: present(&signals.repository).map(str::to_string),
            },
        }
    }

    /// Branch name of the run.
    pub fn branch(&self) -> &str {
        match self {
            CiContext::Direct { branch, .. } | CiContext::PullRequest { branch, .. } => branch,
        }
    }

    /// Pull request identity, for pull-request contexts.
    pub fn pull_request(&self) -> Option<&PullRequest> {
        match self {
            CiContext::PullRequest { pull_request, .. } => Some(pull_request),
            CiContext::Direct { .. } => None,
        }
    }

    /// Repository identity of the run, if known.
    pub fn repository(&self) -> Option<&str> {
        match self {
            CiContext::Direct { repository, .. } => repository.as_deref(),
            CiContext::PullRequest { pull_request, .. } => {
                Some(pull_request.repository.as_str()).filter(|r| !r.is_empty())
            }
        }
    }

    /// Whether this run is attached to a pull request.
    pub fn is_pull_request(&self) -> bool {
        matches!(self, CiContext::PullRequest { .. })
    }
}

impl std::fmt::Display for CiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CiContext::Direct { branch, .. } => write!(f, "branch '{}'", branch),
            CiContext::PullRequest {
                branch,
                pull_request,
            } => write!(
                f,
                "pull request {}#{} (branch '{}')",
                pull_request.repository, pull_request.id, branch
            ),
        }
    }
}
