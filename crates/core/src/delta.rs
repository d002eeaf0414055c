// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Delta engine.
//!
//! Pairs every current measurement with the baseline recorded under the same
//! command name and classifies the difference.
//!
//! # Polarity
//!
//! A higher value is always worse: a positive delta is a regression, a
//! negative delta an improvement. This is fixed for every command; metrics
//! where higher is better (throughput, scores) are reported inverted.

use crate::measurement::{BaselineSet, Measurement};
use serde::{Deserialize, Serialize};

/// Classification of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Value went down.
    Improved,
    /// Value went up.
    Regressed,
    /// Value is equal to the baseline, or there is no baseline.
    Unchanged,
}

impl Status {
    /// Classify a delta by its sign.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Status::Regressed
        } else if delta < 0.0 {
            Status::Improved
        } else {
            Status::Unchanged
        }
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Improved => "improved",
            Status::Regressed => "regressed",
            Status::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report columns in their fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Status glyph.
    Status,
    /// Command display name.
    Command,
    /// Current value.
    Current,
    /// Baseline value.
    Baseline,
    /// Signed delta.
    Delta,
}

impl Column {
    /// Every column, in display order.
    pub const ALL: [Column; 5] = [
        Column::Status,
        Column::Command,
        Column::Current,
        Column::Baseline,
        Column::Delta,
    ];
}

/// One line of the comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Command display name.
    pub command: String,
    /// Current value.
    pub current: f64,
    /// Baseline value, absent for commands never recorded before.
    pub baseline: Option<f64>,
    /// `current - baseline`, or zero without a baseline.
    pub delta: f64,
    /// Classification of `delta`.
    pub status: Status,
}

impl ReportRow {
    /// Compare a measurement with its optional baseline.
    pub fn compare(current: &Measurement, baseline: Option<&Measurement>) -> Self {
        let baseline = baseline.map(|b| b.value);
        let delta = baseline.map_or(0.0, |b| current.value - b);
        Self {
            command: current.command.clone(),
            current: current.value,
            baseline,
            delta,
            status: Status::from_delta(delta),
        }
    }

    /// Whether the row carries a value for the column.
    pub fn has(&self, column: Column) -> bool {
        match column {
            Column::Baseline => self.baseline.is_some(),
            Column::Status | Column::Command | Column::Current | Column::Delta => true,
        }
    }

    /// Populated columns in display order.
    pub fn columns(&self) -> Vec<Column> {
        Column::ALL.into_iter().filter(|c| self.has(*c)).collect()
    }
}

/// Build one report row per measurement, in measurement order.
pub fn compare(measurements: &[Measurement], baseline: &BaselineSet) -> Vec<ReportRow> {
    measurements
        .iter()
        .map(|m| {
            let row = ReportRow::compare(m, baseline.get(&m.command));
            tracing::debug!(
                command = %row.command,
                current = row.current,
                baseline = ?row.baseline,
                delta = row.delta,
                status = %row.status,
                "Compared measurement"
            );
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(entries: &[(&str, f64)]) -> BaselineSet {
        entries
            .iter()
            .map(|(name, value)| Measurement::new(*name, *value))
            .collect()
    }

    #[test]
    fn test_status_from_delta_sign() {
        assert_eq!(Status::from_delta(2.0), Status::Regressed);
        assert_eq!(Status::from_delta(0.001), Status::Regressed);
        assert_eq!(Status::from_delta(-0.5), Status::Improved);
        assert_eq!(Status::from_delta(0.0), Status::Unchanged);
        assert_eq!(Status::from_delta(-0.0), Status::Unchanged);
    }

    #[test]
    fn test_regression_against_baseline() {
        let rows = compare(&[Measurement::new("first", 3.0)], &baseline(&[("first", 1.0)]));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].baseline, Some(1.0));
        assert_eq!(rows[0].delta, 2.0);
        assert_eq!(rows[0].status, Status::Regressed);
    }

    #[test]
    fn test_improvement_against_baseline() {
        let rows = compare(&[Measurement::new("first", 1.0)], &baseline(&[("first", 4.0)]));
        assert_eq!(rows[0].delta, -3.0);
        assert_eq!(rows[0].status, Status::Improved);
    }

    #[test]
    fn test_missing_baseline_is_unchanged() {
        let current = vec![Measurement::new("first", 1.0), Measurement::new("second", 2.0)];
        let rows = compare(&current, &baseline(&[("first", 1.0)]));

        assert_eq!(rows[0].command, "first");
        assert_eq!(rows[0].delta, 0.0);
        assert_eq!(rows[0].status, Status::Unchanged);

        assert_eq!(rows[1].command, "second");
        assert_eq!(rows[1].baseline, None);
        assert_eq!(rows[1].delta, 0.0);
        assert_eq!(rows[1].status, Status::Unchanged);
    }

    #[test]
    fn test_rows_follow_measurement_order() {
        let current = vec![
            Measurement::new("c", 1.0),
            Measurement::new("a", 1.0),
            Measurement::new("b", 1.0),
        ];
        let rows = compare(&current, &BaselineSet::new());
        let order: Vec<_> = rows.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_only_matching_name_is_used() {
        let rows = compare(
            &[Measurement::new("first", 10.0)],
            &baseline(&[("firs", 1.0), ("first ", 2.0), ("second", 3.0)]),
        );
        assert_eq!(rows[0].baseline, None);
        assert_eq!(rows[0].status, Status::Unchanged);
    }

    #[test]
    fn test_columns_reflect_populated_fields() {
        let with = ReportRow::compare(&Measurement::new("a", 2.0), Some(&Measurement::new("a", 1.0)));
        let without = ReportRow::compare(&Measurement::new("a", 2.0), None);

        assert_eq!(with.columns(), Column::ALL.to_vec());
        assert_eq!(
            without.columns(),
            vec![Column::Status, Column::Command, Column::Current, Column::Delta]
        );
    }
}
