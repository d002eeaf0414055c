// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Publisher dispatcher.
//!
//! Decides once per run what happens with the results beyond the local
//! report:
//!
//! ```text
//! not in CI ──────────────────────────────► local only
//! direct branch == primary ───────────────► persist measurements as baseline
//! pull request ───────────────────────────► upsert the managed comment
//! direct branch != primary ───────────────► local only
//! ```
//!
//! A missing collaborator (no credential) downgrades the remote action to
//! local only with a notice; it is never an error.

use crate::context::{CiContext, PullRequest};
use crate::measurement::{BaselineSet, Measurement};
use crate::store::{BaselineStore, CommentPoster};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Remote collaborator a credential unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// Baseline store token.
    BaselineStore,
    /// Comment API token.
    CommentApi,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::BaselineStore => f.write_str("baseline store"),
            Credential::CommentApi => f.write_str("comment API"),
        }
    }
}

/// Why a run stays local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalReason {
    /// The CI signal is absent.
    NotCi,
    /// Direct-branch run on a branch other than the primary one.
    NotPrimaryBranch {
        /// Branch of the run.
        branch: String,
    },
    /// The credential for the needed collaborator is missing.
    MissingCredential(Credential),
    /// No repository identity to address the remote call to.
    MissingRepository,
    /// Nothing was measured, so there is no comment to post.
    EmptyReport,
}

impl fmt::Display for LocalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalReason::NotCi => f.write_str("not running under CI"),
            LocalReason::NotPrimaryBranch { branch } => {
                write!(f, "branch '{}' is not the primary branch", branch)
            }
            LocalReason::MissingCredential(credential) => {
                write!(f, "no {} credential set", credential)
            }
            LocalReason::MissingRepository => f.write_str("repository identity is unknown"),
            LocalReason::EmptyReport => f.write_str("no measurements to report"),
        }
    }
}

/// The remote action selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Store the measurements as the repository's new baseline.
    PersistBaseline {
        /// Repository identity.
        repository: String,
    },
    /// Create or update the managed comment.
    UpsertComment {
        /// Target pull request.
        pull_request: PullRequest,
    },
    /// No remote interaction.
    LocalOnly(LocalReason),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PersistBaseline { repository } => {
                write!(f, "persist measurements as baseline for {}", repository)
            }
            Action::UpsertComment { pull_request } => write!(
                f,
                "update report comment on {}#{}",
                pull_request.repository, pull_request.id
            ),
            Action::LocalOnly(reason) => write!(f, "local report only ({})", reason),
        }
    }
}

/// What a run ended up publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publication {
    /// Measurements appended to the baseline store.
    BaselinePersisted {
        /// Repository identity.
        repository: String,
        /// Number of measurements stored.
        count: usize,
    },
    /// Managed comment created or updated.
    CommentUpserted {
        /// Target pull request.
        pull_request: PullRequest,
    },
    /// Nothing left the machine.
    LocalOnly(LocalReason),
}

impl fmt::Display for Publication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Publication::BaselinePersisted { repository, count } => {
                write!(f, "Stored {} measurements as baseline for {}", count, repository)
            }
            Publication::CommentUpserted { pull_request } => write!(
                f,
                "Updated report comment on {}#{}",
                pull_request.repository, pull_request.id
            ),
            Publication::LocalOnly(reason) => write!(f, "Local report only: {}", reason),
        }
    }
}

/// Holds the remote collaborators available to a run and dispatches to them.
#[derive(Clone)]
pub struct Publisher {
    primary_branch: String,
    ci: bool,
    store: Option<Arc<dyn BaselineStore>>,
    comments: Option<Arc<dyn CommentPoster>>,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("primary_branch", &self.primary_branch)
            .field("ci", &self.ci)
            .field("has_store", &self.store.is_some())
            .field("has_comments", &self.comments.is_some())
            .finish()
    }
}

impl Publisher {
    /// Create a publisher with no collaborators, outside CI.
    pub fn new(primary_branch: impl Into<String>) -> Self {
        Self {
            primary_branch: primary_branch.into(),
            ci: false,
            store: None,
            comments: None,
        }
    }

    /// Set the "running under CI" signal.
    pub fn ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Attach the baseline store.
    pub fn with_store(mut self, store: Arc<dyn BaselineStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the comment poster.
    pub fn with_comments(mut self, comments: Arc<dyn CommentPoster>) -> Self {
        self.comments = Some(comments);
        self
    }

    /// Designated primary branch.
    pub fn primary_branch(&self) -> &str {
        &self.primary_branch
    }

    /// Select the remote action for a context.
    pub fn plan(&self, context: &CiContext) -> Action {
        if !self.ci {
            return Action::LocalOnly(LocalReason::NotCi);
        }

        match context {
            CiContext::Direct { branch, repository } => {
                if *branch != self.primary_branch {
                    return Action::LocalOnly(LocalReason::NotPrimaryBranch {
                        branch: branch.clone(),
                    });
                }
                if self.store.is_none() {
                    return Action::LocalOnly(LocalReason::MissingCredential(
                        Credential::BaselineStore,
                    ));
                }
                match repository {
                    Some(repository) => Action::PersistBaseline {
                        repository: repository.clone(),
                    },
                    None => Action::LocalOnly(LocalReason::MissingRepository),
                }
            }
            CiContext::PullRequest { pull_request, .. } => {
                // Without a baseline every delta would read as "new metric".
                if self.store.is_none() {
                    return Action::LocalOnly(LocalReason::MissingCredential(
                        Credential::BaselineStore,
                    ));
                }
                if self.comments.is_none() {
                    return Action::LocalOnly(LocalReason::MissingCredential(
                        Credential::CommentApi,
                    ));
                }
                if pull_request.repository.is_empty() {
                    return Action::LocalOnly(LocalReason::MissingRepository);
                }
                Action::UpsertComment {
                    pull_request: pull_request.clone(),
                }
            }
        }
    }

    /// Fetch the baseline the current run is compared against.
    ///
    /// Only pull-request runs in CI with a baseline store look anything up;
    /// every other run compares against an empty set.
    pub async fn resolve_baseline(&self, context: &CiContext) -> Result<BaselineSet> {
        let (Some(pull_request), Some(store)) = (context.pull_request(), self.store.as_deref())
        else {
            return Ok(BaselineSet::new());
        };
        if !self.ci || pull_request.repository.is_empty() {
            return Ok(BaselineSet::new());
        }

        let baseline = store.fetch_latest(&pull_request.repository).await?;
        info!(
            repository = %pull_request.repository,
            commands = baseline.len(),
            "Resolved baseline"
        );
        Ok(baseline)
    }

    /// Carry out the planned action. `report` is the rendered markdown table.
    pub async fn publish(
        &self,
        context: &CiContext,
        measurements: &[Measurement],
        report: &str,
    ) -> Result<Publication> {
        match self.plan(context) {
            Action::PersistBaseline { repository } => {
                let store = self
                    .store
                    .as_deref()
                    .ok_or_else(|| Error::persistence("no baseline store configured"))?;
                store.append(&repository, measurements).await?;
                info!(
                    repository = %repository,
                    count = measurements.len(),
                    "Persisted measurements as new baseline"
                );
                Ok(Publication::BaselinePersisted {
                    repository,
                    count: measurements.len(),
                })
            }
            Action::UpsertComment { pull_request } => {
                if report.is_empty() {
                    info!("Empty report, skipping pull request comment");
                    return Ok(Publication::LocalOnly(LocalReason::EmptyReport));
                }
                let comments = self
                    .comments
                    .as_deref()
                    .ok_or_else(|| Error::comment_post("no comment poster configured"))?;
                comments.upsert_comment(&pull_request, report).await?;
                info!(
                    repository = %pull_request.repository,
                    pull_request = %pull_request.id,
                    "Upserted report comment"
                );
                Ok(Publication::CommentUpserted { pull_request })
            }
            Action::LocalOnly(reason) => {
                match &reason {
                    LocalReason::MissingCredential(_) | LocalReason::MissingRepository => {
                        warn!(reason = %reason, "Skipping remote publication");
                    }
                    _ => info!(reason = %reason, "Skipping remote publication"),
                }
                Ok(Publication::LocalOnly(reason))
            }
        }
    }
}
