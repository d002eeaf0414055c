//! Measurement runner for perfwatch.
//!
//! This crate executes the configured measurement commands one at a time,
//! in configuration order, and collects their numeric output.
//!
//! # Quick Start
//!
//! ```no_run
//! use perfwatch_core::Configuration;
//!
//! # async fn example() -> perfwatch_core::Result<()> {
//! let config = Configuration::load("metrics.yml")?;
//! let measurements = perfwatch_runner::run_all(&config).await?;
//!
//! for m in &measurements {
//!     println!("{}: {}", m.command, m.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`command`] - Running a single command and parsing its output
//! - [`io`] - JSON export of run results

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod command;
pub mod io;

pub use command::{measure, parse_output};
pub use io::{read_report_json, write_report_json, RunReport};

use perfwatch_core::{Configuration, Measurement, Result};
use tracing::info;

/// Run every configured command and return one measurement per command.
///
/// Commands run sequentially with no timeout. The first failure aborts the
/// whole run; no partial result is returned.
///
/// # Errors
///
/// Returns `MeasurementExecution` if a command cannot be started or exits
/// unsuccessfully, and `MeasurementParse` if its output is not a number.
pub async fn run_all(configuration: &Configuration) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::with_capacity(configuration.len());

    for spec in configuration.commands() {
        let measurement = measure(spec).await?;
        info!(
            command = %measurement.command,
            value = measurement.value,
            "Measured"
        );
        measurements.push(measurement);
    }

    Ok(measurements)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use perfwatch_core::{CommandSpec, Error};

    #[tokio::test]
    async fn test_run_all_preserves_configuration_order() {
        let config = Configuration::from_yaml_str(
            r#"
commands:
  first: "echo '1'"
  second: "echo '2'"
  third: "printf '  3.5  '"
"#,
        )
        .unwrap();

        let measurements = run_all(&config).await.unwrap();

        let pairs: Vec<_> = measurements
            .iter()
            .map(|m| (m.command.as_str(), m.value))
            .collect();
        assert_eq!(pairs, vec![("first", 1.0), ("second", 2.0), ("third", 3.5)]);
        assert!(measurements[0].timestamp <= measurements[2].timestamp);
    }

    #[tokio::test]
    async fn test_run_all_aborts_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let config = Configuration::new(vec![
            CommandSpec::new("ok", "echo 1"),
            CommandSpec::new("bad", "exit 1"),
            CommandSpec::new("after", format!("touch {} && echo 2", marker.display())),
        ])
        .unwrap();

        let err = run_all(&config).await.unwrap_err();
        assert!(matches!(err, Error::MeasurementExecution { ref command, .. } if command == "bad"));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let config = Configuration::new(Vec::new()).unwrap();
        assert!(run_all(&config).await.unwrap().is_empty());
    }
}
