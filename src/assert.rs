//! src/assert.rs
//!
//! The assertion family used inside case bodies. Every assertion returns a
//! `CaseResult`, so the first failing check aborts the body through `?`.
//!
//! Equality assertions take `(expected, actual, description)`; ordering
//! assertions take `(actual, bound, description)`.

use crate::domain::{CaseResult, Failure};
use std::{fmt::Debug, future::Future};

fn fail(description: &str, detail: impl AsRef<str>) -> Failure {
    if description.is_empty() {
        Failure::assertion(detail.as_ref())
    } else {
        Failure::assertion(format!("{description}: {}", detail.as_ref()))
    }
}

pub fn assert_true(condition: bool, description: &str) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(fail(description, "expected true but got false").with_values(true, false))
    }
}

pub fn assert_false(condition: bool, description: &str) -> CaseResult {
    if condition {
        Err(fail(description, "expected false but got true").with_values(false, true))
    } else {
        Ok(())
    }
}

pub fn assert_equals<E, A>(expected: E, actual: A, description: &str) -> CaseResult
where
    E: Debug,
    A: Debug + PartialEq<E>,
{
    if actual == expected {
        return Ok(());
    }
    Err(fail(description, format!("expected {expected:?} but got {actual:?}"))
        .with_values(expected, actual))
}

pub fn assert_not_equals<E, A>(unexpected: E, actual: A, description: &str) -> CaseResult
where
    E: Debug,
    A: Debug + PartialEq<E>,
{
    if actual != unexpected {
        return Ok(());
    }
    Err(fail(description, format!("got disallowed value {actual:?}")))
}

pub fn assert_approx_equals(expected: f64, actual: f64, epsilon: f64, description: &str) -> CaseResult {
    if (actual - expected).abs() <= epsilon {
        return Ok(());
    }
    Err(fail(
        description,
        format!("expected {expected:?} +/- {epsilon:?} but got {actual:?}"),
    )
    .with_values(expected, actual))
}

pub fn assert_less_than<T: PartialOrd + Debug>(actual: T, bound: T, description: &str) -> CaseResult {
    if actual < bound {
        return Ok(());
    }
    Err(fail(description, format!("expected a value less than {bound:?} but got {actual:?}")))
}

pub fn assert_less_than_equal<T: PartialOrd + Debug>(actual: T, bound: T, description: &str) -> CaseResult {
    if actual <= bound {
        return Ok(());
    }
    Err(fail(
        description,
        format!("expected a value less than or equal to {bound:?} but got {actual:?}"),
    ))
}

pub fn assert_greater_than<T: PartialOrd + Debug>(actual: T, bound: T, description: &str) -> CaseResult {
    if actual > bound {
        return Ok(());
    }
    Err(fail(description, format!("expected a value greater than {bound:?} but got {actual:?}")))
}

pub fn assert_greater_than_equal<T: PartialOrd + Debug>(actual: T, bound: T, description: &str) -> CaseResult {
    if actual >= bound {
        return Ok(());
    }
    Err(fail(
        description,
        format!("expected a value greater than or equal to {bound:?} but got {actual:?}"),
    ))
}

pub fn assert_in_array<T: PartialEq + Debug>(actual: &T, candidates: &[T], description: &str) -> CaseResult {
    if candidates.contains(actual) {
        return Ok(());
    }
    Err(fail(description, format!("value {actual:?} not in array {candidates:?}")))
}

/// Compares lengths first, then reports the first differing index.
pub fn assert_array_equals<T: PartialEq + Debug>(expected: &[T], actual: &[T], description: &str) -> CaseResult {
    if expected.len() != actual.len() {
        return Err(fail(
            description,
            format!("lengths differ, expected {} but got {}", expected.len(), actual.len()),
        )
        .with_values(expected, actual));
    }
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        None => Ok(()),
        Some(index) => Err(fail(
            description,
            format!(
                "expected {:?} but got {:?} at index {index}",
                expected[index], actual[index]
            ),
        )
        .with_values(expected, actual)),
    }
}

/// Unwraps an `Ok` value, failing the case on `Err`.
pub fn assert_ok<T, E: Debug>(result: Result<T, E>, description: &str) -> Result<T, Failure> {
    result.map_err(|e| fail(description, format!("expected Ok but got Err({e:?})")))
}

/// Unwraps an `Err` value, failing the case on `Ok`.
pub fn assert_err<T: Debug, E>(result: Result<T, E>, description: &str) -> Result<E, Failure> {
    match result {
        Ok(value) => Err(fail(description, format!("expected Err but got Ok({value:?})"))),
        Err(e) => Ok(e),
    }
}

/// Awaits `future` and requires it to reject, yielding the rejection reason.
pub async fn assert_rejects<T, E, Fut>(future: Fut, description: &str) -> Result<E, Failure>
where
    T: Debug,
    Fut: Future<Output = Result<T, E>>,
{
    match future.await {
        Ok(value) => Err(fail(
            description,
            format!("expected the future to reject but it resolved with {value:?}"),
        )),
        Err(e) => Ok(e),
    }
}

pub fn assert_unreached(description: &str) -> CaseResult {
    Err(fail(description, "reached unreachable code"))
}
