//! JSON export of run results.
//!
//! This module writes the measurements and compared rows of a run to a JSON
//! file so later CI steps can consume them.

use chrono::{DateTime, Utc};
use perfwatch_core::{Measurement, ReportRow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a run produced, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Measurements in configuration order.
    pub measurements: Vec<Measurement>,
    /// Compared rows in configuration order.
    pub rows: Vec<ReportRow>,
}

impl RunReport {
    /// Bundle a run's results, stamped now.
    pub fn new(measurements: Vec<Measurement>, rows: Vec<ReportRow>) -> Self {
        Self {
            generated_at: Utc::now(),
            measurements,
            rows,
        }
    }
}

/// Write a run report as pretty JSON, creating parent directories.
pub fn write_report_json(report: &RunReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Read a run report written by [`write_report_json`].
pub fn read_report_json(path: impl AsRef<Path>) -> Result<RunReport> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::{compare, BaselineSet, Status};

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/report.json");

        let measurements = vec![Measurement::new("first", 3.0)];
        let baseline = BaselineSet::from_history(vec![Measurement::new("first", 1.0)]);
        let rows = compare(&measurements, &baseline);
        write_report_json(&RunReport::new(measurements, rows), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rows"][0]["command"], "first");
        assert_eq!(json["rows"][0]["delta"], 2.0);
        assert_eq!(json["rows"][0]["status"], "regressed");
        assert_eq!(json["measurements"][0]["current"], 3.0);

        let back = read_report_json(&path).unwrap();
        assert_eq!(back.rows[0].status, Status::Regressed);
    }

    #[test]
    fn test_absent_baseline_serializes_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let measurements = vec![Measurement::new("second", 2.0)];
        let rows = compare(&measurements, &BaselineSet::new());
        write_report_json(&RunReport::new(measurements, rows), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["rows"][0]["baseline"].is_null());
    }
}
