//! src/step.rs
//!
//! The `StepController` handed to callback-style cases. Continuations that
//! run later (timers, event handlers) are wrapped so their failures are
//! attributed to the owning case, and `done` settles it.

use crate::{
    assert::assert_unreached,
    context::TestContext,
    domain::{CaseResult, Failure},
    error::Result,
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    time::Duration,
};
use tokio::sync::oneshot;

struct StepInner {
    ctx: TestContext,
    settle_tx: RefCell<Option<oneshot::Sender<CaseResult>>>,
    done_called: Cell<bool>,
}

/// Completion handle for a callback-style case. Clones share the same case.
#[derive(Clone)]
pub struct StepController {
    inner: Rc<StepInner>,
}

impl StepController {
    pub(crate) fn new(ctx: TestContext, settle_tx: oneshot::Sender<CaseResult>) -> Self {
        Self {
            inner: Rc::new(StepInner {
                ctx,
                settle_tx: RefCell::new(Some(settle_tx)),
                done_called: Cell::new(false),
            }),
        }
    }

    pub fn context(&self) -> &TestContext {
        &self.inner.ctx
    }

    pub fn name(&self) -> &str {
        self.inner.ctx.name()
    }

    /// True once a result was delivered or the engine settled the case.
    pub fn is_settled(&self) -> bool {
        self.inner.settle_tx.borrow().is_none() || self.inner.ctx.is_settled()
    }

    pub fn add_cleanup<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.inner.ctx.add_cleanup(action)
    }

    /// Delivers the case result. The first delivery wins; later ones, and
    /// any delivery after a timeout, are discarded.
    pub fn settle(&self, result: CaseResult) {
        let Some(tx) = self.inner.settle_tx.borrow_mut().take() else {
            tracing::trace!(case = %self.name(), "Case already settled; discarding result");
            return;
        };
        if tx.send(result).is_err() {
            tracing::trace!(case = %self.name(), "Case timed out; discarding late result");
        }
    }

    /// Marks the case as passed.
    ///
    /// A second call is a no-op, or a recorded harness error when the run is
    /// configured with `strict_done`.
    pub fn done(&self) {
        if self.inner.done_called.replace(true) {
            if self.inner.ctx.shared().strict_done() {
                self.inner
                    .ctx
                    .shared()
                    .record_harness_error(format!("done() called more than once for case `{}`", self.name()));
            }
            return;
        }
        self.settle(Ok(()));
    }

    pub fn fail(&self, failure: Failure) {
        self.settle(Err(failure));
    }

    /// Runs `f` now on behalf of the case. An error or panic fails the case.
    /// Returns whether the step ran and succeeded; steps of a settled case
    /// are skipped.
    pub fn step<F>(&self, f: F) -> bool
    where
        F: FnOnce() -> CaseResult,
    {
        if self.is_settled() {
            tracing::trace!(case = %self.name(), "Skipping step of a settled case");
            return false;
        }
        let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => Err(Failure::from_panic(payload.as_ref())),
        };
        match result {
            Ok(()) => true,
            Err(failure) => {
                self.fail(failure);
                false
            }
        }
    }

    /// Wraps a continuation so each call runs as a step of this case.
    pub fn step_func<A, F>(&self, mut f: F) -> impl FnMut(A) + 'static
    where
        A: 'static,
        F: FnMut(A) -> CaseResult + 'static,
    {
        let this = self.clone();
        move |arg| {
            this.step(|| f(arg));
        }
    }

    /// Like `step_func`, then marks the case done if the step succeeded.
    pub fn step_func_done<A, F>(&self, mut f: F) -> impl FnMut(A) + 'static
    where
        A: 'static,
        F: FnMut(A) -> CaseResult + 'static,
    {
        let this = self.clone();
        move |arg| {
            if this.step(|| f(arg)) {
                this.done();
            }
        }
    }

    /// A continuation that fails the case if it is ever called.
    pub fn unreached_func<A>(&self, description: impl Into<String>) -> impl FnMut(A) + 'static
    where
        A: 'static,
    {
        let this = self.clone();
        let description = description.into();
        move |_| {
            this.step(|| assert_unreached(&description));
        }
    }

    /// Runs `f` as a step after `delay_ms`.
    ///
    /// # Panics
    ///
    /// Must be called from inside a harness run (it spawns onto the run's
    /// `LocalSet`).
    pub fn step_timeout<F>(&self, f: F, delay_ms: u64)
    where
        F: FnOnce() -> CaseResult + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            this.step(f);
        });
    }
}

impl fmt::Debug for StepController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepController")
            .field("case", &self.name())
            .field("settled", &self.is_settled())
            .finish()
    }
}
