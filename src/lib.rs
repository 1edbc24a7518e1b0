//! src/lib.rs
//!
//! A single-threaded, cooperative test-case harness. Scripts register
//! synchronous, callback-style and future-based cases into a
//! `HarnessContext`; `run_all` executes them with per-case timeouts and
//! exactly-once cleanup, and produces a `RunReport`.

pub mod app;
pub mod assert;
pub mod config;
pub mod context;
pub mod domain;
pub mod engine;
pub mod error;
pub mod registry;
pub mod report;
pub mod selftest;
pub mod step;

pub use app::App;
pub use config::{ReportFormat, ReportOrder, RunConfig};
pub use context::TestContext;
pub use domain::{CaseId, CaseKind, CaseOptions, CaseRecord, CaseResult, CaseStatus, Failure, FailureKind};
pub use engine::{run_all, Engine};
pub use error::{Error, Result};
pub use registry::{CaseBody, CaseInfo, HarnessContext};
pub use report::{RunReport, Summary};
pub use step::StepController;
