//! src/error.rs
//!
//! Defines the library's `Error` enum using `thiserror`. These are failures
//! that happen outside of a running case: configuration, registration misuse
//! and report serialization. Failures *inside* a case are `domain::Failure`.

use crate::domain::CaseId;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Invalid case filter pattern: {0}")]
    Filter(#[from] regex::Error),

    #[error("Failed to serialize or deserialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Case name must not be empty")]
    EmptyCaseName,

    #[error("A case named `{0}` is already registered")]
    DuplicateCase(String),

    #[error("No case with id {0} is registered")]
    UnknownCase(CaseId),

    #[error("Cannot add a cleanup to case `{0}` after it has settled")]
    CleanupAfterSettle(String),
}
