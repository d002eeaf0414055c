//! Remote collaborators for perfwatch.
//!
//! This crate provides the HTTP implementations of the
//! [`BaselineStore`](perfwatch_core::BaselineStore) and
//! [`CommentPoster`](perfwatch_core::CommentPoster) interfaces.

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod upstream;

pub use upstream::{AirtableStore, GithubCommentPoster};
