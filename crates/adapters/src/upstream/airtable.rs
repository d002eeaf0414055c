// Copyright 2025 Perfwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Airtable baseline store.
//!
//! Measurements are stored as rows of one Airtable table with the fields
//! `command`, `current`, `timestamp` and `repository`. The table is only ever
//! appended to.
//!
//! # Example
//!
//! ```ignore
//! use perfwatch_adapters::upstream::airtable::AirtableStore;
//!
//! let store = AirtableStore::new("appXXXXXXXX", token)?.with_table("metrics");
//! let baseline = store.fetch_latest("owner/repo").await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perfwatch_core::{BaselineSet, BaselineStore, Measurement};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Default Airtable API root.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com";

/// Default table name.
pub const DEFAULT_TABLE: &str = "Table 1";

/// Airtable accepts at most this many records per create request.
const MAX_RECORDS_PER_REQUEST: usize = 10;

/// Errors that can occur talking to Airtable.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error object returned by the API
    #[error("Airtable error {kind}: {message}")]
    Api { kind: String, message: String },

    /// Non-success status without an error object
    #[error("Airtable returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Invalid Airtable response: {0}")]
    Decode(#[from] serde_json::Error),

    /// API URL could not be built
    #[error("Invalid Airtable URL: {0}")]
    InvalidUrl(String),
}

/// Result type for Airtable operations.
pub type Result<T> = std::result::Result<T, AirtableError>;

/// Stored row layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordFields {
    command: String,
    current: f64,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
}

impl RecordFields {
    fn from_measurement(measurement: &Measurement, repository: &str) -> Self {
        Self {
            command: measurement.command.clone(),
            current: measurement.value,
            timestamp: measurement.timestamp,
            repository: Some(repository.to_string()),
        }
    }

    fn into_measurement(self) -> Measurement {
        Measurement::at(self.command, self.current, self.timestamp)
    }
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    fields: Value,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

/// Baseline store backed by an Airtable table.
#[derive(Clone)]
pub struct AirtableStore {
    http: Client,
    api_url: String,
    space: String,
    table: String,
    token: String,
}

impl std::fmt::Debug for AirtableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableStore")
            .field("api_url", &self.api_url)
            .field("space", &self.space)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl AirtableStore {
    /// Create a store for an Airtable base with the default table.
    pub fn new(space: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("perfwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            space: space.into(),
            table: DEFAULT_TABLE.to_string(),
            token: token.into(),
        })
    }

    /// Override the API root (tests, proxies).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Use a different table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// `{api}/v0/{space}/{table}` with the path segments percent-encoded.
    pub fn table_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AirtableError::InvalidUrl(format!("{}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AirtableError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["v0", self.space.as_str(), self.table.as_str()]);
        Ok(url)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(error) = body.as_ref().and_then(|b| b.get("error")) {
            return Err(match error {
                Value::String(kind) => AirtableError::Api {
                    kind: kind.clone(),
                    message: String::new(),
                },
                other => AirtableError::Api {
                    kind: other["type"].as_str().unwrap_or("UNKNOWN").to_string(),
                    message: other["message"].as_str().unwrap_or_default().to_string(),
                },
            });
        }
        if !status.is_success() {
            return Err(AirtableError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        match body {
            Some(body) => Ok(body),
            None => Ok(serde_json::from_str(&text)?),
        }
    }

    fn repository_formula(repository: &str) -> String {
        format!(
            "{{repository}}='{}'",
            repository.replace('\\', "\\\\").replace('\'', "\\'")
        )
    }

    /// Every stored measurement of a repository, newest first.
    pub async fn history(&self, repository: &str) -> Result<Vec<Measurement>> {
        let url = self.table_url()?;
        let formula = Self::repository_formula(repository);
        let mut measurements = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![
                ("sort[0][field]", "timestamp"),
                ("sort[0][direction]", "desc"),
                ("filterByFormula", formula.as_str()),
            ];
            if let Some(offset) = offset.as_deref() {
                query.push(("offset", offset));
            }

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&query)
                .send()
                .await?;
            let page: ListResponse = serde_json::from_value(Self::read_json(response).await?)?;
            debug!(records = page.records.len(), "Fetched Airtable page");

            for record in page.records {
                // Airtable returns rows left blank in the UI with no fields.
                if record.fields.get("command").map_or(true, Value::is_null) {
                    debug!(
                        record = record.id.as_deref().unwrap_or("?"),
                        "Skipping blank Airtable record"
                    );
                    continue;
                }
                let fields: RecordFields =
                    serde_json::from_value(record.fields).map_err(|e| {
                        warn!(
                            record = record.id.as_deref().unwrap_or("?"),
                            error = %e,
                            "Malformed Airtable record"
                        );
                        AirtableError::Decode(e)
                    })?;
                measurements.push(fields.into_measurement());
            }

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(measurements)
    }

    /// Append measurements in batches of at most ten records.
    pub async fn store(&self, repository: &str, measurements: &[Measurement]) -> Result<()> {
        let url = self.table_url()?;
        for batch in measurements.chunks(MAX_RECORDS_PER_REQUEST) {
            let records: Vec<Value> = batch
                .iter()
                .map(|m| json!({ "fields": RecordFields::from_measurement(m, repository) }))
                .collect();
            let response = self
                .http
                .post(url.clone())
                .bearer_auth(&self.token)
                .json(&json!({ "records": records }))
                .send()
                .await?;
            Self::read_json(response).await?;
            debug!(records = batch.len(), "Created Airtable records");
        }
        Ok(())
    }
}

#[async_trait]
impl BaselineStore for AirtableStore {
    async fn fetch_latest(&self, repository: &str) -> perfwatch_core::Result<BaselineSet> {
        let history = self
            .history(repository)
            .await
            .map_err(|e| perfwatch_core::Error::baseline_fetch(e.to_string()))?;
        Ok(BaselineSet::from_history(history))
    }

    async fn append(
        &self,
        repository: &str,
        measurements: &[Measurement],
    ) -> perfwatch_core::Result<()> {
        self.store(repository, measurements)
            .await
            .map_err(|e| perfwatch_core::Error::persistence(e.to_string()))
    }
}
