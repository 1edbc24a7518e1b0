//! tests/integration/scenarios.rs
//!
//! End-to-end runs of small suites shaped like real conformance scripts.

use crate::common::harness::{self, EventLog};
use case_harness::{
    assert::{assert_equals, assert_true},
    CaseStatus, Failure, HarnessContext, ReportFormat, RunConfig, RunReport,
};
use std::time::Duration;
use test_log::test;
use tokio::time;

#[test(tokio::test)]
async fn promise_case_resolving_immediately_passes() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("navigator.scheduling exists", |_| async { Ok(()) })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    assert_eq!(report.records().len(), 1);
    assert_eq!(report.records()[0].status, CaseStatus::Passed);
    assert!(report.records()[0].failure_message.is_none());
    assert!(report.is_success());
}

#[test(tokio::test)]
async fn promise_case_with_failed_equality_reports_both_values() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("response.status", |_| async {
            assert_equals(1, 2, "status matches")?;
            Ok(())
        })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    let record = harness::record(&report, "response.status");
    assert_eq!(record.status, CaseStatus::Failed);
    let message = record.failure_message.as_deref().unwrap();
    assert!(message.contains("expected 1"), "{message}");
    assert!(message.contains("got 2"), "{message}");
}

#[test(tokio::test)]
async fn callback_case_without_done_times_out() {
    let mut harness = HarnessContext::new();
    harness
        .register_callback_async("websocket close event", |_t| Ok(()))
        .unwrap();

    let started = time::Instant::now();
    let report = harness::run(harness, harness::config(50)).await;

    assert!(started.elapsed() >= Duration::from_millis(50));
    let record = harness::record(&report, "websocket close event");
    assert_eq!(record.status, CaseStatus::TimedOut);
    assert!(record.duration_ms >= 50);
}

#[test(tokio::test)]
async fn report_follows_registration_order_not_completion_order() {
    let mut harness = HarnessContext::new();
    harness
        .register_promise_based("first registered, settles last", |_| async {
            time::sleep(Duration::from_millis(20)).await;
            Ok(())
        })
        .unwrap();
    harness
        .register_promise_based("second registered, settles first", |_| async { Ok(()) })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    assert_eq!(
        harness::names(&report),
        vec!["first registered, settles last", "second registered, settles first"]
    );
}

#[test(tokio::test)]
async fn every_cleanup_runs_when_the_body_fails_first() {
    let log = EventLog::new();
    let mut harness = HarnessContext::new();
    let l = log.clone();
    harness
        .register_synchronous("opens three resources", move |ctx| {
            for name in ["db", "socket", "worker"] {
                let log = l.clone();
                let probe = ctx.clone();
                ctx.add_cleanup(move || log.push(format!("{name} released after {}", probe.status())))?;
            }
            Err(Failure::uncaught("TypeError: failed to fetch"))
        })
        .unwrap();

    let report = harness::run(harness, harness::config(1_000)).await;

    let record = harness::record(&report, "opens three resources");
    assert_eq!(record.status, CaseStatus::Failed);
    assert_eq!(record.failure_message.as_deref(), Some("TypeError: failed to fetch"));
    assert_eq!(
        log.entries(),
        vec![
            "db released after FAIL",
            "socket released after FAIL",
            "worker released after FAIL",
        ]
    );
}

#[test(tokio::test)]
async fn mixed_suite_renders_as_json_and_parses_back() {
    let mut harness = HarnessContext::new();
    harness
        .register_synchronous("sync ok", |_| assert_true(true, "trivial"))
        .unwrap();
    harness
        .register_callback_async("callback ok", |t| {
            t.done();
            Ok(())
        })
        .unwrap();
    harness
        .register_promise_based("promise fails", |_| async {
            assert_equals("open", "closed", "readyState")
        })
        .unwrap();

    let config = RunConfig {
        report_format: ReportFormat::Json,
        ..harness::config(1_000)
    };
    let report = harness::run(harness, config.clone()).await;
    let json = report.render(config.report_format).unwrap();

    let parsed = RunReport::from_json(&json).unwrap();
    assert_eq!(parsed, report);
    let summary = parsed.summary();
    assert_eq!((summary.passed, summary.failed), (2, 1));
    assert!(!parsed.is_success());
}
