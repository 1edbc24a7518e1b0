//! src/main.rs
//!
//! The entrypoint for the harness binary.
//!
//! This file is intentionally minimal. Its sole responsibilities are:
//!   - Setting up a single-threaded `tokio` runtime.
//!   - Initializing the logger.
//!   - Loading the configuration and handing it to `App`.

use case_harness::{App, RunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // `RUST_LOG=debug` shows every case settlement. Logs go to stderr so the
    // report on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "💥 Harness failed to run");
        std::process::exit(2);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = RunConfig::load()?;
    let report = App::new(config).run().await?;
    if !report.is_success() {
        let summary = report.summary();
        anyhow::bail!(
            "{} failed, {} timed out, {} harness error(s)",
            summary.failed,
            summary.timed_out,
            report.harness_errors().len()
        );
    }
    Ok(())
}
