// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Upstream service adapters.
//!
//! - **Airtable**: append-only measurement history used as the baseline store
//! - **GitHub**: managed pull request comment
//!
//! Each adapter exposes its own error type for direct use and maps failures
//! into the matching `perfwatch_core::Error` kind when used through the
//! collaborator traits. No request is retried.
//!
//! # Example
//!
//! ```ignore
//! use perfwatch_adapters::upstream::prelude::*;
//!
//! let store = AirtableStore::new(space, airtable_token)?;
//! let poster = GithubCommentPoster::new(&github_token)?;
//! ```

pub mod airtable;
pub mod github;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::airtable::{AirtableError, AirtableStore};
    pub use super::github::{CommentChange, GithubCommentPoster, GithubError};
}

pub use airtable::AirtableStore;
pub use github::GithubCommentPoster;
