//! src/context.rs
//!
//! Per-case state shared between the engine and the case body. A body only
//! ever sees it through `TestContext`; the engine owns the status transitions.

use crate::{
    domain::CaseStatus,
    error::{Error, Result},
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// State that outlives individual cases for the duration of a run.
pub(crate) struct RunShared {
    strict_done: bool,
    harness_errors: RefCell<Vec<String>>,
}

impl RunShared {
    pub(crate) fn new(strict_done: bool) -> Self {
        Self {
            strict_done,
            harness_errors: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn strict_done(&self) -> bool {
        self.strict_done
    }

    pub(crate) fn record_harness_error(&self, message: String) {
        tracing::warn!(error = %message, "Harness error");
        self.harness_errors.borrow_mut().push(message);
    }

    pub(crate) fn take_harness_errors(&self) -> Vec<String> {
        self.harness_errors.take()
    }
}

pub(crate) struct CaseCell {
    name: String,
    status: Cell<CaseStatus>,
    cleanups: RefCell<Vec<Cleanup>>,
}

impl CaseCell {
    pub(crate) fn new(name: String, cleanups: Vec<Cleanup>) -> Self {
        Self {
            name,
            status: Cell::new(CaseStatus::Pending),
            cleanups: RefCell::new(cleanups),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn status(&self) -> CaseStatus {
        self.status.get()
    }

    pub(crate) fn start(&self) {
        debug_assert_eq!(self.status.get(), CaseStatus::Pending);
        self.status.set(CaseStatus::Running);
    }

    /// Moves the case to a terminal status. Returns `false` if it already
    /// had one, in which case nothing changes.
    pub(crate) fn settle(&self, status: CaseStatus) -> bool {
        debug_assert!(status.is_terminal());
        if self.status.get().is_terminal() {
            return false;
        }
        self.status.set(status);
        true
    }

    pub(crate) fn add_cleanup(&self, action: Cleanup) -> Result<()> {
        if self.status.get().is_terminal() {
            return Err(Error::CleanupAfterSettle(self.name.clone()));
        }
        self.cleanups.borrow_mut().push(action);
        Ok(())
    }

    /// Drains the cleanup sequence in registration order.
    pub(crate) fn take_cleanups(&self) -> Vec<Cleanup> {
        self.cleanups.take()
    }
}

/// A case body's handle on its own case.
///
/// Cloning is cheap; all clones refer to the same case.
#[derive(Clone)]
pub struct TestContext {
    cell: Rc<CaseCell>,
    shared: Rc<RunShared>,
}

impl TestContext {
    pub(crate) fn new(cell: Rc<CaseCell>, shared: Rc<RunShared>) -> Self {
        Self { cell, shared }
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    pub fn status(&self) -> CaseStatus {
        self.cell.status()
    }

    pub fn is_settled(&self) -> bool {
        self.cell.status().is_terminal()
    }

    /// Registers an action to run once the case settles, whatever the
    /// outcome. Cleanups run in the order they were added.
    ///
    /// Fails with `Error::CleanupAfterSettle` once the case is terminal.
    pub fn add_cleanup<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.cell.add_cleanup(Box::new(action))
    }

    pub(crate) fn shared(&self) -> &RunShared {
        &self.shared
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name())
            .field("status", &self.status())
            .finish()
    }
}
