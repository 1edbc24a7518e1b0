//! src/engine/outcome.rs
//!
//! Maps what a case body produced (a result, a caught panic, an elapsed
//! timer) onto the terminal status the case settles with. Kept separate from
//! the scheduling loop so the mapping can be tested on its own.

use crate::domain::{CaseResult, CaseStatus, Failure};
use std::{any::Any, time::Duration};

/// The terminal outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    Passed,
    Failed(Failure),
    TimedOut(Failure),
    NotRun,
}

impl Settlement {
    pub(crate) fn timed_out(limit: Duration) -> Self {
        Settlement::TimedOut(Failure::timeout(limit))
    }

    pub(crate) fn status(&self) -> CaseStatus {
        match self {
            Settlement::Passed => CaseStatus::Passed,
            Settlement::Failed(_) => CaseStatus::Failed,
            Settlement::TimedOut(_) => CaseStatus::TimedOut,
            Settlement::NotRun => CaseStatus::NotRun,
        }
    }

    pub(crate) fn into_failure(self) -> Option<Failure> {
        match self {
            Settlement::Failed(failure) | Settlement::TimedOut(failure) => Some(failure),
            Settlement::Passed | Settlement::NotRun => None,
        }
    }
}

impl From<CaseResult> for Settlement {
    fn from(result: CaseResult) -> Self {
        match result {
            Ok(()) => Settlement::Passed,
            Err(failure) => Settlement::Failed(failure),
        }
    }
}

/// Folds a caught panic into the body's own result.
pub(crate) fn caught(result: Result<CaseResult, Box<dyn Any + Send>>) -> CaseResult {
    result.unwrap_or_else(|payload| Err(Failure::from_panic(payload.as_ref())))
}
