// file: src/reporter/mod.rs
// version: 2.0.0
// guid: b39f0e5c-7a14-4d82-9c6b-e0d5a2f8c317

//! Per-host result accounting for fan-out operations

use crate::error::BootstrapError;
use crate::Result;
use serde::Serialize;
use tracing::{error, info};

/// Outcome of one host in a fan-out run
#[derive(Debug, Serialize)]
pub struct ExecutionResult {
    pub host: String,
    pub output: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<BootstrapError>,
}

fn serialize_error<S>(error: &Option<BootstrapError>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl ExecutionResult {
    pub fn success(host: impl Into<String>, output: Option<String>) -> Self {
        Self {
            host: host.into(),
            output,
            error: None,
        }
    }

    pub fn failure(host: impl Into<String>, error: BootstrapError) -> Self {
        Self {
            host: host.into(),
            output: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered results of one fan-out, one entry per targeted host in input order
#[derive(Debug, Default, Serialize)]
pub struct FanOutReport {
    pub operation: String,
    pub results: Vec<ExecutionResult>,
}

impl FanOutReport {
    pub fn new(operation: impl Into<String>, results: Vec<ExecutionResult>) -> Self {
        Self {
            operation: operation.into(),
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(ExecutionResult::is_success)
    }

    /// One-line summary, e.g. `join: 4/5 hosts succeeded`
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} hosts succeeded",
            self.operation,
            self.succeeded().count(),
            self.results.len()
        )
    }

    /// Log per-host status followed by the summary line
    pub fn print_summary(&self) {
        for result in &self.results {
            match &result.error {
                None => info!("[{}] ok", result.host),
                Some(e) => error!("[{}] failed: {}", result.host, e),
            }
        }

        if self.is_success() {
            info!("{}", self.summary());
        } else {
            error!("{}", self.summary());
        }
    }

    /// Turn any per-host failure into a single error naming every failed host
    pub fn into_result(self) -> Result<Self> {
        let failed: Vec<String> = self
            .failed()
            .filter_map(|r| r.error.as_ref().map(|e| format!("  {}: {}", r.host, e)))
            .collect();

        if failed.is_empty() {
            return Ok(self);
        }

        Err(BootstrapError::FanOutError {
            failed: failed.len(),
            total: self.results.len(),
            details: failed.join("\n"),
        })
    }
}
