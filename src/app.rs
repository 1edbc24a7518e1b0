//! src/app.rs
//!
//! Defines the `App` struct behind the binary: it runs the built-in
//! self-check suite under the loaded configuration and prints the report.

use crate::{
    config::RunConfig,
    engine::run_all,
    error::Result,
    report::RunReport,
    selftest,
};
use std::io::Write;

pub struct App {
    config: RunConfig,
}

impl App {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs the suite and writes the rendered report to `out`.
    pub async fn run_to<W: Write>(self, out: &mut W) -> Result<RunReport> {
        tracing::info!(
            format = ?self.config.report_format,
            order = ?self.config.report_order,
            filter = self.config.global_filter.as_deref(),
            "🚀 Running harness self-check"
        );
        let harness = selftest::suite()?;
        let report = run_all(harness, &self.config).await?;
        writeln!(out, "{}", report.render(self.config.report_format)?)?;
        Ok(report)
    }

    pub async fn run(self) -> Result<RunReport> {
        let stdout = std::io::stdout();
        self.run_to(&mut stdout.lock()).await
    }
}
