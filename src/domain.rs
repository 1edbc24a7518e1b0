//! src/domain.rs
//!
//! Core data structures shared by the registry, the engine and the report:
//! case identity and status, the structured `Failure` a case settles with,
//! per-case options, and the final per-case record.

use serde::{Deserialize, Serialize};
use std::{any::Any, collections::BTreeMap, fmt, time::Duration};

/// What a case body (or one of its steps) produces.
pub type CaseResult = Result<(), Failure>;

/// Index of a case inside its `HarnessContext`, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub(crate) usize);

impl CaseId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case#{}", self.0)
    }
}

/// How the engine waits for a case body to settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Synchronous,
    Callback,
    Promise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Running,
    Passed,
    Failed,
    TimedOut,
    /// Excluded by the run's name filter.
    NotRun,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseStatus::Passed | CaseStatus::Failed | CaseStatus::TimedOut | CaseStatus::NotRun
        )
    }

    /// Short upper-case label used by the text report.
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "PENDING",
            CaseStatus::Running => "RUNNING",
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::TimedOut => "TIMEOUT",
            CaseStatus::NotRun => "NOTRUN",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A predicate check failed.
    Assertion,
    /// The body returned a foreign error or panicked.
    Uncaught,
    /// The case did not settle within its budget.
    Timeout,
    /// The body used the harness incorrectly.
    Misuse,
}

/// The detail a failed or timed-out case settles with.
///
/// `Failure` deliberately does not implement `std::error::Error`, which lets
/// any error type convert into it through `?` inside a case body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Assertion, message)
    }

    pub fn uncaught(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Uncaught, message)
    }

    pub fn misuse(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Misuse, message)
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("did not settle within {} ms", limit.as_millis()),
        )
    }

    /// Attaches the debug-rendered expected and actual values.
    pub fn with_values(mut self, expected: impl fmt::Debug, actual: impl fmt::Debug) -> Self {
        self.expected = Some(format!("{expected:?}"));
        self.actual = Some(format!("{actual:?}"));
        self
    }

    /// Converts a caught panic payload into an `Uncaught` failure.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::uncaught(panic_message(payload))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error + 'static,
{
    fn from(error: E) -> Self {
        Self::uncaught(error.to_string())
    }
}

/// Extracts the message of a panic payload (`&str` or `String`).
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Registration-time options for a case.
///
/// `metadata` and `resources` are carried for the surrounding test-execution
/// environment (discovery, filtering); the harness never interprets them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOptions {
    /// Overrides `RunConfig::timeout_ms` for this case.
    pub timeout_ms: Option<u64>,
    pub metadata: BTreeMap<String, String>,
    pub resources: Vec<String>,
}

impl CaseOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }
}

/// The final record of one case in a `RunReport`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub name: String,
    pub status: CaseStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl CaseRecord {
    pub(crate) fn new(
        name: String,
        status: CaseStatus,
        duration: Duration,
        failure: Option<Failure>,
    ) -> Self {
        Self {
            name,
            status,
            duration_ms: duration.as_millis() as u64,
            failure_message: failure.as_ref().map(|f| f.message.clone()),
            failure,
        }
    }
}
