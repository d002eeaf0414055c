// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement and baseline types.
//!
//! A [`Measurement`] is one numeric result of running a configured command.
//! A [`BaselineSet`] holds the most recent stored measurement per command name
//! for a single repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One numeric result of running a configured command at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Display name of the command, unique within a run.
    pub command: String,
    /// Parsed numeric output.
    #[serde(rename = "current")]
    pub value: f64,
    /// When the measurement was taken.
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Create a measurement stamped with the current time.
    pub fn new(command: impl Into<String>, value: f64) -> Self {
        Self::at(command, value, Utc::now())
    }

    /// Create a measurement with an explicit timestamp.
    pub fn at(command: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            command: command.into(),
            value,
            timestamp,
        }
    }
}

/// The most recent prior measurement for every command of one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineSet {
    latest: HashMap<String, Measurement>,
}

impl BaselineSet {
    /// Create an empty baseline set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce a measurement history to one measurement per command name,
    /// keeping the one with the greatest timestamp.
    ///
    /// On equal timestamps the entry seen first wins, so a history sorted
    /// newest-first keeps the remote store's ordering.
    pub fn from_history<I>(history: I) -> Self
    where
        I: IntoIterator<Item = Measurement>,
    {
        let mut set = Self::new();
        for measurement in history {
            set.offer(measurement);
        }
        set
    }

    /// Record a measurement if it is newer than the one held for its command.
    pub fn offer(&mut self, measurement: Measurement) {
        match self.latest.get(&measurement.command) {
            Some(existing) if existing.timestamp >= measurement.timestamp => {}
            _ => {
                self.latest.insert(measurement.command.clone(), measurement);
            }
        }
    }

    /// Baseline for a command name, if one was ever recorded.
    pub fn get(&self, command: &str) -> Option<&Measurement> {
        self.latest.get(command)
    }

    /// Number of distinct commands with a baseline.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether no baseline exists at all.
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Iterate over the held baselines in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.latest.values()
    }
}

impl FromIterator<Measurement> for BaselineSet {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        Self::from_history(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_measurement_serializes_value_as_current() {
        let m = Measurement::at("bundle", 12.5, ts(0));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["command"], "bundle");
        assert_eq!(json["current"], 12.5);
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_from_history_keeps_latest_per_command() {
        let set = BaselineSet::from_history(vec![
            Measurement::at("first", 1.0, ts(10)),
            Measurement::at("first", 5.0, ts(30)),
            Measurement::at("first", 3.0, ts(20)),
            Measurement::at("second", 7.0, ts(5)),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("first").unwrap().value, 5.0);
        assert_eq!(set.get("second").unwrap().value, 7.0);
        assert!(set.get("third").is_none());
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen() {
        let set: BaselineSet = vec![
            Measurement::at("first", 1.0, ts(10)),
            Measurement::at("first", 2.0, ts(10)),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.get("first").unwrap().value, 1.0);
    }

    #[test]
    fn test_empty_history() {
        let set = BaselineSet::from_history(Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
