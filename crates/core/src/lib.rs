// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types and decision logic for perfwatch.
//!
//! perfwatch runs a configured set of measurement commands in CI, compares
//! the numbers with the latest baseline recorded for the repository and
//! reports the deltas locally and on the pull request.
//!
//! # Modules
//!
//! - [`config`] - Measurement configuration loading
//! - [`measurement`] - `Measurement` and `BaselineSet`
//! - [`context`] - CI context resolution
//! - [`delta`] - Delta engine and report rows
//! - [`store`] - Baseline store and comment poster interfaces
//! - [`memory`] - In-memory collaborators
//! - [`publish`] - Publisher dispatcher

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod delta;
pub mod error;
pub mod measurement;
pub mod memory;
pub mod publish;
pub mod store;

pub use config::{CommandSpec, Configuration, DEFAULT_CONFIG_FILE};
pub use context::{CiContext, EnvSignals, PullRequest};
pub use delta::{compare, Column, ReportRow, Status};
pub use error::{Error, Result};
pub use measurement::{BaselineSet, Measurement};
pub use publish::{Action, Credential, LocalReason, Publication, Publisher};
pub use store::{BaselineStore, CommentPoster, COMMENT_SENTINEL};
