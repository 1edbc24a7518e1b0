//! src/report.rs
//!
//! The `RunReport` produced once per run, plus its text and JSON renderings.

use crate::{
    config::ReportFormat,
    domain::{CaseRecord, CaseStatus},
    error::Result,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Per-status counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub not_run: usize,
}

impl Summary {
    /// Pass rate over the cases that actually ran, as a percentage.
    pub fn pass_rate(&self) -> f64 {
        let executed = self.total - self.not_run;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }
}

/// The finalized outcome of one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    records: Vec<CaseRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    harness_errors: Vec<String>,
}

impl RunReport {
    pub(crate) fn new(records: Vec<CaseRecord>, harness_errors: Vec<String>) -> Self {
        Self {
            records,
            harness_errors,
        }
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Misuse detected after a case settled and panicking cleanups.
    pub fn harness_errors(&self) -> &[String] {
        &self.harness_errors
    }

    pub fn get(&self, name: &str) -> Option<&CaseRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn status_of(&self, name: &str) -> Option<CaseStatus> {
        self.get(name).map(|record| record.status)
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.records.len(),
            ..Summary::default()
        };
        for record in &self.records {
            match record.status {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed => summary.failed += 1,
                CaseStatus::TimedOut => summary.timed_out += 1,
                CaseStatus::NotRun => summary.not_run += 1,
                CaseStatus::Pending | CaseStatus::Running => {}
            }
        }
        summary
    }

    /// True when nothing failed, nothing timed out and the harness itself
    /// reported no errors.
    pub fn is_success(&self) -> bool {
        let summary = self.summary();
        summary.failed == 0 && summary.timed_out == 0 && self.harness_errors.is_empty()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut output = String::new();
        for record in &self.records {
            let _ = write!(output, "{:<7} {} ({} ms)", record.status.label(), record.name, record.duration_ms);
            if let Some(message) = &record.failure_message {
                let _ = write!(output, ": {message}");
            }
            output.push('\n');
        }
        for error in &self.harness_errors {
            let _ = writeln!(output, "HARNESS ERROR {error}");
        }

        let summary = self.summary();
        let _ = write!(
            output,
            "\nTotal: {}\n\
             Passed: {} ({:.1}%)\n\
             Failed: {}\n\
             Timed out: {}\n\
             Not run: {}",
            summary.total,
            summary.passed,
            summary.pass_rate(),
            summary.failed,
            summary.timed_out,
            summary.not_run,
        );
        output
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
