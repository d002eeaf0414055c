// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the measurement pipeline.

use thiserror::Error;

/// Result type used throughout perfwatch.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a perfwatch run.
///
/// Configuration, measurement and baseline errors abort the run before the
/// local report is printed. Persistence and comment errors are only raised
/// after the report has been emitted.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed measurement configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A measurement command could not be started or exited unsuccessfully.
    #[error("Measurement command '{command}' failed: {message}")]
    MeasurementExecution {
        /// Display name of the command.
        command: String,
        /// What went wrong.
        message: String,
    },

    /// A measurement command printed something that is not a number.
    #[error("Measurement command '{command}' produced non-numeric output: {output:?}")]
    MeasurementParse {
        /// Display name of the command.
        command: String,
        /// Trimmed standard output.
        output: String,
    },

    /// Baseline lookup failed.
    #[error("Failed to fetch baseline: {0}")]
    BaselineFetch(String),

    /// Storing the new baseline failed.
    #[error("Failed to persist measurements: {0}")]
    Persistence(String),

    /// Creating or updating the pull request comment failed.
    #[error("Failed to post pull request comment: {0}")]
    CommentPost(String),

    /// Local I/O failure (report export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local serialization failure (report export).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a measurement execution error.
    pub fn execution(command: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MeasurementExecution {
            command: command.into(),
            message: msg.into(),
        }
    }

    /// Create a measurement parse error.
    pub fn parse(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::MeasurementParse {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a baseline fetch error.
    pub fn baseline_fetch(msg: impl Into<String>) -> Self {
        Self::BaselineFetch(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a comment posting error.
    pub fn comment_post(msg: impl Into<String>) -> Self {
        Self::CommentPost(msg.into())
    }

    /// Whether this error prevents the local report from being produced.
    pub fn is_fatal_before_report(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MeasurementExecution { .. }
                | Self::MeasurementParse { .. }
                | Self::BaselineFetch(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_command() {
        let err = Error::parse("bundle", "12kb");
        assert_eq!(
            err.to_string(),
            "Measurement command 'bundle' produced non-numeric output: \"12kb\""
        );

        let err = Error::execution("bundle", "exit status: 2");
        assert!(err.to_string().contains("'bundle'"));
    }

    #[test]
    fn test_fatal_before_report() {
        assert!(Error::configuration("bad").is_fatal_before_report());
        assert!(Error::baseline_fetch("down").is_fatal_before_report());
        assert!(!Error::persistence("down").is_fatal_before_report());
        assert!(!Error::comment_post("down").is_fatal_before_report());
    }
}
