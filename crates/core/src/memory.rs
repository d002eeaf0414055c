// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process collaborators.
//!
//! [`InMemoryBaselineStore`] and [`InMemoryCommentPoster`] keep their state in
//! memory and follow the same contracts as the HTTP adapters. They back the
//! pipeline tests and local dry runs.

use crate::context::PullRequest;
use crate::measurement::{BaselineSet, Measurement};
use crate::store::{is_managed_comment, managed_comment_body, BaselineStore, CommentPoster};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Append-only measurement history keyed by repository.
#[derive(Debug, Default)]
pub struct InMemoryBaselineStore {
    history: Mutex<HashMap<String, Vec<Measurement>>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryBaselineStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with history for one repository.
    pub fn with_history(repository: impl Into<String>, history: Vec<Measurement>) -> Self {
        let store = Self::new();
        lock(&store.history).insert(repository.into(), history);
        store
    }

    /// Make every subsequent call fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<String>) {
        *lock(&self.failure) = message;
    }

    /// Everything stored for a repository, oldest first.
    pub fn history(&self, repository: &str) -> Vec<Measurement> {
        lock(&self.history)
            .get(repository)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Option<String> {
        lock(&self.failure).clone()
    }
}

#[async_trait]
impl BaselineStore for InMemoryBaselineStore {
    async fn fetch_latest(&self, repository: &str) -> Result<BaselineSet> {
        if let Some(message) = self.check() {
            return Err(Error::baseline_fetch(message));
        }
        Ok(BaselineSet::from_history(self.history(repository)))
    }

    async fn append(&self, repository: &str, measurements: &[Measurement]) -> Result<()> {
        if let Some(message) = self.check() {
            return Err(Error::persistence(message));
        }
        lock(&self.history)
            .entry(repository.to_string())
            .or_default()
            .extend_from_slice(measurements);
        Ok(())
    }
}

/// A pull request comment held by [`InMemoryCommentPoster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment id, unique per poster.
    pub id: u64,
    /// Full body including any sentinel.
    pub body: String,
}

/// Pull request comments keyed by `(repository, pull request id)`.
#[derive(Debug, Default)]
pub struct InMemoryCommentPoster {
    comments: Mutex<HashMap<(String, String), Vec<Comment>>>,
    next_id: Mutex<u64>,
}

impl InMemoryCommentPoster {
    /// Create a poster with no comments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a comment not owned by perfwatch, as another user would.
    pub fn add_foreign_comment(&self, pull_request: &PullRequest, body: impl Into<String>) {
        let id = self.allocate_id();
        lock(&self.comments)
            .entry(key(pull_request))
            .or_default()
            .push(Comment {
                id,
                body: body.into(),
            });
    }

    /// All comments on a pull request, in creation order.
    pub fn comments(&self, pull_request: &PullRequest) -> Vec<Comment> {
        lock(&self.comments)
            .get(&key(pull_request))
            .cloned()
            .unwrap_or_default()
    }

    /// Comments carrying the sentinel marker.
    pub fn managed_comments(&self, pull_request: &PullRequest) -> Vec<Comment> {
        self.comments(pull_request)
            .into_iter()
            .filter(|c| is_managed_comment(&c.body))
            .collect()
    }

    fn allocate_id(&self) -> u64 {
        let mut next = lock(&self.next_id);
        *next += 1;
        *next
    }
}

fn key(pull_request: &PullRequest) -> (String, String) {
    (pull_request.repository.clone(), pull_request.id.clone())
}

#[async_trait]
impl CommentPoster for InMemoryCommentPoster {
    async fn upsert_comment(&self, pull_request: &PullRequest, report: &str) -> Result<()> {
        let body = managed_comment_body(report);
        let id = self.allocate_id();
        let mut comments = lock(&self.comments);
        let thread = comments.entry(key(pull_request)).or_default();

        match thread.iter_mut().find(|c| is_managed_comment(&c.body)) {
            Some(existing) => existing.body = body,
            None => thread.push(Comment { id, body }),
        }
        Ok(())
    }
}
