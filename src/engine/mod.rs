//! src/engine/mod.rs
//!
//! Defines the `Engine`, which executes the cases of a `HarnessContext` on a
//! single thread. Every case is started in registration order; suspended
//! cases (callback and promise bodies) are then interleaved on the run's
//! `LocalSet` until each one settles or exhausts its budget.

use crate::{
    config::{ReportOrder, RunConfig},
    context::{CaseCell, RunShared, TestContext},
    domain::{panic_message, CaseOptions, CaseRecord, CaseResult, Failure},
    error::Result,
    registry::{CaseBody, HarnessContext, TestCase},
    report::RunReport,
    step::StepController,
};
use futures::{
    future::{self, FutureExt, LocalBoxFuture},
    stream::{FuturesUnordered, StreamExt},
};
use regex::Regex;
use std::{
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};
use tokio::{
    sync::oneshot::{self, error::TryRecvError},
    task::LocalSet,
    time::{self, Instant},
};

mod outcome;

use outcome::Settlement;

type Waiter = LocalBoxFuture<'static, (usize, Settlement)>;

/// What starting a case produced.
enum Started {
    /// The case settled during its synchronous portion.
    Settled(Settlement),
    /// The case suspended; the future resolves once it settles or times out.
    Suspended(LocalBoxFuture<'static, Settlement>),
}

struct Slot {
    cell: Rc<CaseCell>,
    started_at: Instant,
    record: Option<CaseRecord>,
}

/// Runs every case in `harness` under `config` and returns the report.
///
/// The run happens on a fresh `LocalSet`, so case bodies need not be `Send`.
/// Only setup problems (an invalid filter pattern) return an error; case
/// failures are always reported in the `RunReport`.
pub async fn run_all(harness: HarnessContext, config: &RunConfig) -> Result<RunReport> {
    let engine = Engine::new(config.clone())?;
    Ok(LocalSet::new().run_until(engine.run(harness)).await)
}

/// The single-threaded case scheduler.
pub struct Engine {
    config: RunConfig,
    filter: Option<Regex>,
    shared: Rc<RunShared>,
}

impl Engine {
    pub fn new(config: RunConfig) -> Result<Self> {
        Ok(Self {
            filter: config.filter()?,
            shared: Rc::new(RunShared::new(config.strict_done)),
            config,
        })
    }

    /// Executes the run. Must be polled inside a `LocalSet`, since steps
    /// scheduled by callback cases are spawned onto it.
    pub async fn run(self, harness: HarnessContext) -> RunReport {
        let cases = harness.into_cases();
        tracing::info!(
            cases = cases.len(),
            timeout_ms = self.config.timeout_ms,
            serial = self.config.serial,
            "Starting run"
        );
        let run_started = Instant::now();

        let mut slots: Vec<Slot> = Vec::with_capacity(cases.len());
        let mut completion_order = Vec::with_capacity(cases.len());
        let mut suspended: FuturesUnordered<Waiter> = FuturesUnordered::new();

        for (index, case) in cases.into_iter().enumerate() {
            let TestCase {
                name,
                options,
                body,
                cleanups,
            } = case;
            let selected = self.is_selected(&name);
            let cell = Rc::new(CaseCell::new(name, cleanups));
            slots.push(Slot {
                cell: cell.clone(),
                started_at: Instant::now(),
                record: None,
            });

            if !selected {
                tracing::debug!(case = %cell.name(), "Case excluded by filter");
                self.finalize(&mut slots[index], Settlement::NotRun);
                completion_order.push(index);
                continue;
            }

            cell.start();
            let ctx = TestContext::new(cell, self.shared.clone());
            match self.start(&options, body, ctx) {
                Started::Settled(settlement) => {
                    self.finalize(&mut slots[index], settlement);
                    completion_order.push(index);
                }
                Started::Suspended(waiter) => {
                    let name = slots[index].cell.name().to_string();
                    suspended.push(self.guard(index, &name, waiter));
                }
            }

            if self.config.serial {
                while let Some((index, settlement)) = suspended.next().await {
                    self.finalize(&mut slots[index], settlement);
                    completion_order.push(index);
                }
            }
        }

        while let Some((index, settlement)) = suspended.next().await {
            self.finalize(&mut slots[index], settlement);
            completion_order.push(index);
        }

        let records: Vec<CaseRecord> = match self.config.report_order {
            ReportOrder::Registration => slots.into_iter().filter_map(|slot| slot.record).collect(),
            ReportOrder::Completion => {
                let mut records: Vec<Option<CaseRecord>> =
                    slots.into_iter().map(|slot| slot.record).collect();
                completion_order
                    .into_iter()
                    .filter_map(|index| records[index].take())
                    .collect()
            }
        };
        let report = RunReport::new(records, self.shared.take_harness_errors());

        let summary = report.summary();
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            timed_out = summary.timed_out,
            not_run = summary.not_run,
            duration_ms = run_started.elapsed().as_millis() as u64,
            "Run finished"
        );
        report
    }

    fn is_selected(&self, name: &str) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter.is_match(name))
    }

    /// Invokes the synchronous portion of a case body. A promise body is
    /// polled once here, so its code up to the first pending `.await` runs
    /// in registration order too. The case's deadline is fixed now, before
    /// any later case starts.
    fn start(&self, options: &CaseOptions, body: CaseBody, ctx: TestContext) -> Started {
        let limit = self.config.case_timeout(options.timeout_ms);
        let deadline = Instant::now() + limit;
        tracing::debug!(case = %ctx.name(), kind = ?body.kind(), timeout_ms = limit.as_millis() as u64, "Starting case");

        match body {
            CaseBody::Synchronous(body) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| body(&ctx)));
                Started::Settled(outcome::caught(result).into())
            }
            CaseBody::Callback(body) => {
                let (settle_tx, mut settle_rx) = oneshot::channel::<CaseResult>();
                let controller = StepController::new(ctx, settle_tx);
                let result = panic::catch_unwind(AssertUnwindSafe(|| body(controller.clone())));
                if let Err(failure) = outcome::caught(result) {
                    controller.fail(failure);
                }
                drop(controller);

                match settle_rx.try_recv() {
                    Ok(result) => Started::Settled(result.into()),
                    // Every controller is gone, so `done` can never arrive.
                    // The receiver is finished and must not be polled again.
                    Err(TryRecvError::Closed) => Started::Suspended(
                        async move {
                            time::sleep_until(deadline).await;
                            Settlement::timed_out(limit)
                        }
                        .boxed_local(),
                    ),
                    Err(TryRecvError::Empty) => Started::Suspended(
                        async move {
                            let settled = async {
                                match settle_rx.await {
                                    Ok(result) => result,
                                    Err(_) => future::pending().await,
                                }
                            };
                            match time::timeout_at(deadline, settled).await {
                                Ok(result) => result.into(),
                                Err(_) => Settlement::timed_out(limit),
                            }
                        }
                        .boxed_local(),
                    ),
                }
            }
            CaseBody::Promise(body) => {
                let body_future = match panic::catch_unwind(AssertUnwindSafe(|| body(ctx))) {
                    Ok(body_future) => body_future,
                    Err(payload) => return Started::Settled(outcome::caught(Err(payload)).into()),
                };
                let mut guarded = AssertUnwindSafe(body_future).catch_unwind().boxed_local();
                if let Some(result) = (&mut guarded).now_or_never() {
                    return Started::Settled(outcome::caught(result).into());
                }
                Started::Suspended(
                    async move {
                        match time::timeout_at(deadline, guarded).await {
                            Ok(result) => outcome::caught(result).into(),
                            Err(_) => Settlement::timed_out(limit),
                        }
                    }
                    .boxed_local(),
                )
            }
        }
    }

    /// Wraps a suspended case so a panic while waiting on it fails the case
    /// instead of unwinding out of the run.
    fn guard(&self, index: usize, name: &str, waiter: LocalBoxFuture<'static, Settlement>) -> Waiter {
        let shared = self.shared.clone();
        let name = name.to_string();
        AssertUnwindSafe(waiter)
            .catch_unwind()
            .map(move |result| {
                let settlement = result.unwrap_or_else(|payload| {
                    let failure = Failure::from_panic(payload.as_ref());
                    shared.record_harness_error(format!(
                        "waiting on case `{name}` panicked: {}",
                        failure.message
                    ));
                    Settlement::Failed(failure)
                });
                (index, settlement)
            })
            .boxed_local()
    }

    /// Sets the terminal status, then runs the case's cleanups in
    /// registration order and records the result.
    fn finalize(&self, slot: &mut Slot, settlement: Settlement) {
        let status = settlement.status();
        if !slot.cell.settle(status) {
            tracing::warn!(case = %slot.cell.name(), "Ignoring second settlement of a case");
            return;
        }
        let duration = slot.started_at.elapsed();
        let failure = settlement.into_failure();
        tracing::debug!(
            case = %slot.cell.name(),
            %status,
            duration_ms = duration.as_millis() as u64,
            failure = failure.as_ref().map(|f| f.message.as_str()),
            "Case settled"
        );

        for cleanup in slot.cell.take_cleanups() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(cleanup)) {
                self.shared.record_harness_error(format!(
                    "cleanup for case `{}` panicked: {}",
                    slot.cell.name(),
                    panic_message(payload.as_ref())
                ));
            }
        }

        slot.record = Some(CaseRecord::new(
            slot.cell.name().to_string(),
            status,
            duration,
            failure,
        ));
    }
}
