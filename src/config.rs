//! src/config.rs
//!
//! Defines the strongly-typed `RunConfig` for a harness run, loaded from
//! files and environment variables via `figment`.

use crate::error::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of the rendered `RunReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

/// Order of the records in the `RunReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportOrder {
    Registration,
    Completion,
}

/// Top-level struct holding all run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub timeout_ms: u64,
    pub timeout_multiplier: u32,
    pub global_filter: Option<String>,
    pub report_format: ReportFormat,
    pub report_order: ReportOrder,
    pub serial: bool,
    pub strict_done: bool,
}

impl RunConfig {
    /// Loads configuration from `harness.toml` and `HARNESS_*` environment
    /// variables, on top of the `Default` implementation.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(RunConfig::default()))
            .merge(Toml::file("harness.toml"))
            .merge(Env::prefixed("HARNESS_"))
            .extract()
    }

    /// Compiles `global_filter`. An invalid pattern is a setup error.
    pub fn filter(&self) -> Result<Option<Regex>> {
        Ok(self.global_filter.as_deref().map(Regex::new).transpose()?)
    }

    /// The effective budget for a case, honoring its override and the
    /// run-wide multiplier.
    pub fn case_timeout(&self, override_ms: Option<u64>) -> Duration {
        let base = override_ms.unwrap_or(self.timeout_ms);
        Duration::from_millis(base.saturating_mul(u64::from(self.timeout_multiplier.max(1))))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            timeout_multiplier: 1,
            global_filter: None,
            report_format: ReportFormat::Text,
            report_order: ReportOrder::Registration,
            serial: false,
            strict_done: false,
        }
    }
}
