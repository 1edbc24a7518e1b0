//! tests/component/engine.rs
//!
//! Component tests for the `Engine`: status mapping for each case kind,
//! interleaving, ordering, filtering and timeouts.

use crate::common::harness::{self, EventLog};
use case_harness::{
    assert::{assert_equals, assert_true},
    run_all, CaseBody, CaseOptions, CaseStatus, Error, Failure, FailureKind, HarnessContext,
    ReportOrder, RunConfig,
};
use futures::future;
use std::{io, time::Duration};
use test_log::test;
use tokio::{sync::oneshot, time};

#[test(tokio::test)]
async fn synchronous_panic_fails_only_that_case() {
    let mut harness = HarnessContext::new();
    harness
        .register_synchronous("idl interface exists", |_| panic!("interface object missing"))
        .unwrap();
    harness
        .register_synchronous("idl attribute exists", |_| assert_true(true, "attribute"))
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    let failed = harness::record(&report, "idl interface exists");
    assert_eq!(failed.status, CaseStatus::Failed);
    assert_eq!(failed.failure_message.as_deref(), Some("interface object missing"));
    assert_eq!(failed.failure.as_ref().unwrap().kind, FailureKind::Uncaught);
    assert_eq!(report.status_of("idl attribute exists"), Some(CaseStatus::Passed));
}

#[test(tokio::test)]
async fn synchronous_bodies_are_never_timed_out() {
    let mut harness = HarnessContext::new();
    harness
        .register_synchronous("slow but synchronous", |_| {
            std::thread::sleep(Duration::from_millis(30));
            Ok(())
        })
        .unwrap();

    let report = harness::run(harness, harness::config(5)).await;
    assert_eq!(report.status_of("slow but synchronous"), Some(CaseStatus::Passed));
}

#[test(tokio::test)]
async fn promise_rejection_keeps_the_reason() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("cookie store rejects", |_| async {
            Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "cookie access denied"))?;
            Ok(())
        })
        .unwrap();
    harness
        .register_promise_based("scheduler task panics", |_| async {
            time::sleep(Duration::from_millis(1)).await;
            panic!("task priority unsupported");
        })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    let rejected = harness::record(&report, "cookie store rejects");
    assert_eq!(rejected.status, CaseStatus::Failed);
    assert_eq!(rejected.failure_message.as_deref(), Some("cookie access denied"));

    let panicked = harness::record(&report, "scheduler task panics");
    assert_eq!(panicked.status, CaseStatus::Failed);
    assert_eq!(panicked.failure_message.as_deref(), Some("task priority unsupported"));
}

#[test(tokio::test)]
async fn promise_cases_interleave_unless_serial() {
    fn build() -> HarnessContext {
        let (tx, rx) = oneshot::channel::<u32>();
        let mut harness = HarnessContext::new();
        harness
            .register_promise_based("waits for sibling", move |_| async move {
                let value = rx.await?;
                assert_equals(7, value, "value from sibling")
            })
            .unwrap();
        harness
            .register_promise_based("signals sibling", move |_| async move {
                time::sleep(Duration::from_millis(5)).await;
                let _ = tx.send(7);
                Ok(())
            })
            .unwrap();
        harness
    }

    let concurrent = harness::run(build(), harness::config(1_000)).await;
    assert_eq!(concurrent.status_of("waits for sibling"), Some(CaseStatus::Passed));
    assert_eq!(concurrent.status_of("signals sibling"), Some(CaseStatus::Passed));

    let serial_config = RunConfig {
        serial: true,
        ..harness::config(50)
    };
    let serial = harness::run(build(), serial_config).await;
    assert_eq!(serial.status_of("waits for sibling"), Some(CaseStatus::TimedOut));
    assert_eq!(serial.status_of("signals sibling"), Some(CaseStatus::Passed));
}

#[test(tokio::test)]
async fn completion_order_is_available_on_request() {
    fn build() -> HarnessContext {
        let mut harness = HarnessContext::new();
        harness
            .register_promise_based("slow fetch", |_| async {
                time::sleep(Duration::from_millis(30)).await;
                Ok(())
            })
            .unwrap();
        harness
            .register_promise_based("fast fetch", |_| async { Ok(()) })
            .unwrap();
        harness
            .register_synchronous("sync check", |_| Ok(()))
            .unwrap();
        harness
    }

    let by_registration = harness::run(build(), harness::config(1_000)).await;
    assert_eq!(
        harness::names(&by_registration),
        vec!["slow fetch", "fast fetch", "sync check"]
    );

    let completion_config = RunConfig {
        report_order: ReportOrder::Completion,
        ..harness::config(1_000)
    };
    let by_completion = harness::run(build(), completion_config).await;
    assert_eq!(
        harness::names(&by_completion),
        vec!["fast fetch", "sync check", "slow fetch"]
    );
}

#[test(tokio::test)]
async fn every_kind_starts_in_registration_order() {
    let log = EventLog::new();
    let mut harness = HarnessContext::new();
    let l = log.clone();
    harness
        .register_promise_based("A", move |_| async move {
            l.push("A setup");
            time::sleep(Duration::from_millis(5)).await;
            l.push("A resumed");
            Ok(())
        })
        .unwrap();
    let l = log.clone();
    harness
        .register_callback_async("B", move |t| {
            l.push("B setup");
            t.done();
            Ok(())
        })
        .unwrap();
    let l = log.clone();
    harness
        .register_synchronous("C", move |_| {
            l.push("C setup");
            Ok(())
        })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    assert!(report.is_success());
    assert_eq!(
        log.entries(),
        vec!["A setup", "B setup", "C setup", "A resumed"]
    );
}

#[test(tokio::test)]
async fn promise_failing_before_its_first_await_settles_at_start() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("rejects before awaiting", |_| async {
            assert_equals("granted", "denied", "permission state")?;
            time::sleep(Duration::from_millis(1)).await;
            Ok(())
        })
        .unwrap();
    harness
        .register_synchronous("later sync", |_| Ok(()))
        .unwrap();

    let config = RunConfig {
        report_order: ReportOrder::Completion,
        ..harness::config(10_000)
    };
    let report = harness::run(harness, config).await;

    assert_eq!(harness::names(&report), vec!["rejects before awaiting", "later sync"]);
    assert_eq!(
        report.status_of("rejects before awaiting"),
        Some(CaseStatus::Failed)
    );
}

#[test(tokio::test)]
async fn slow_later_case_does_not_extend_an_earlier_budget() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("never resolves", |_| future::pending())
        .unwrap();
    harness
        .register_synchronous("blocks the thread", |_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .unwrap();

    let started = time::Instant::now();
    let report = harness::run(harness, harness::config(150)).await;

    assert_eq!(report.status_of("never resolves"), Some(CaseStatus::TimedOut));
    assert_eq!(report.status_of("blocks the thread"), Some(CaseStatus::Passed));
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "budget was counted from the first poll: {:?}",
        started.elapsed()
    );
}

#[test(tokio::test)]
async fn filtered_cases_are_not_run_but_still_cleaned_up() {
    let log = EventLog::new();
    let mut harness = HarnessContext::new();
    harness
        .register_synchronous("fetch basic", |_| Ok(()))
        .unwrap();
    let excluded = {
        let log = log.clone();
        harness
            .register_synchronous("webgpu adapter", move |_| {
                log.push("body ran");
                Ok(())
            })
            .unwrap()
    };
    harness.add_cleanup(excluded, log.recorder("cleanup ran")).unwrap();

    let config = RunConfig {
        global_filter: Some("^fetch".into()),
        ..harness::config(1_000)
    };
    let report = harness::run(harness, config).await;

    assert_eq!(report.status_of("fetch basic"), Some(CaseStatus::Passed));
    assert_eq!(report.status_of("webgpu adapter"), Some(CaseStatus::NotRun));
    assert_eq!(log.entries(), vec!["cleanup ran".to_string()]);
    assert!(report.is_success());
}

#[test(tokio::test)]
async fn invalid_filter_aborts_before_any_case_starts() {
    let log = EventLog::new();
    let mut harness = HarnessContext::new();
    let body_log = log.clone();
    harness
        .register_synchronous("never runs", move |_| {
            body_log.push("body ran");
            Ok(())
        })
        .unwrap();

    let config = RunConfig {
        global_filter: Some("[unclosed".into()),
        ..harness::config(1_000)
    };
    let err = run_all(harness, &config).await.unwrap_err();

    assert!(matches!(err, Error::Filter(_)));
    assert!(log.entries().is_empty());
}

#[test(tokio::test)]
async fn per_case_timeout_overrides_the_run_default() {
    let mut harness = HarnessContext::new();
    harness
        .register(
            "websocket never opens",
            CaseOptions::default().with_timeout_ms(20),
            CaseBody::promise(|_| async {
                future::pending::<()>().await;
                Ok(())
            }),
        )
        .unwrap();

    let report = harness::run(harness, harness::config(10_000)).await;

    let record = harness::record(&report, "websocket never opens");
    assert_eq!(record.status, CaseStatus::TimedOut);
    assert!(record.duration_ms >= 20);
    assert!(record.duration_ms < 10_000);
    let failure = record.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.message, "did not settle within 20 ms");
}

#[test(tokio::test)]
async fn timeout_multiplier_stretches_every_budget() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("webnn graph compiles", |_| async {
            time::sleep(Duration::from_millis(40)).await;
            Ok(())
        })
        .unwrap();

    let config = RunConfig {
        timeout_multiplier: 10,
        ..harness::config(20)
    };
    let report = harness::run(harness, config).await;
    assert_eq!(report.status_of("webnn graph compiles"), Some(CaseStatus::Passed));
}

#[test(tokio::test)]
async fn assertion_failures_are_distinct_from_uncaught_errors() {
    let mut harness = HarnessContext::new();
    harness
        .register_synchronous("status code", |_| assert_equals(200, 404, "response.status"))
        .unwrap();
    harness
        .register_synchronous("explicit misuse", |_| Err(Failure::misuse("called twice")))
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    let assertion = harness::record(&report, "status code").failure.clone().unwrap();
    assert_eq!(assertion.kind, FailureKind::Assertion);
    assert_eq!(assertion.expected.as_deref(), Some("200"));
    assert_eq!(assertion.actual.as_deref(), Some("404"));

    let misuse = harness::record(&report, "explicit misuse").failure.clone().unwrap();
    assert_eq!(misuse.kind, FailureKind::Misuse);
}
