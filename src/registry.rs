//! src/registry.rs
//!
//! `HarnessContext` is the explicit, per-run registry of cases. Scripts
//! register into it and hand it to `run_all`, which consumes it.

use crate::{
    context::{Cleanup, TestContext},
    domain::{CaseId, CaseKind, CaseOptions, CaseResult},
    error::{Error, Result},
    step::StepController,
};
use futures::future::{FutureExt, LocalBoxFuture};
use std::{collections::HashSet, fmt, future::Future};

pub type SyncBody = Box<dyn FnOnce(&TestContext) -> CaseResult>;
pub type CallbackBody = Box<dyn FnOnce(StepController) -> CaseResult>;
pub type PromiseBody = Box<dyn FnOnce(TestContext) -> LocalBoxFuture<'static, CaseResult>>;

/// A case body, tagged by how the engine waits for it to settle.
pub enum CaseBody {
    Synchronous(SyncBody),
    Callback(CallbackBody),
    Promise(PromiseBody),
}

impl CaseBody {
    pub fn synchronous<F>(body: F) -> Self
    where
        F: FnOnce(&TestContext) -> CaseResult + 'static,
    {
        CaseBody::Synchronous(Box::new(body))
    }

    pub fn callback<F>(body: F) -> Self
    where
        F: FnOnce(StepController) -> CaseResult + 'static,
    {
        CaseBody::Callback(Box::new(body))
    }

    pub fn promise<F, Fut>(body: F) -> Self
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = CaseResult> + 'static,
    {
        CaseBody::Promise(Box::new(move |ctx| body(ctx).boxed_local()))
    }

    pub fn kind(&self) -> CaseKind {
        match self {
            CaseBody::Synchronous(_) => CaseKind::Synchronous,
            CaseBody::Callback(_) => CaseKind::Callback,
            CaseBody::Promise(_) => CaseKind::Promise,
        }
    }
}

impl fmt::Debug for CaseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaseBody::{:?}", self.kind())
    }
}

pub(crate) struct TestCase {
    pub(crate) name: String,
    pub(crate) options: CaseOptions,
    pub(crate) body: CaseBody,
    pub(crate) cleanups: Vec<Cleanup>,
}

/// A registered case as seen by discovery tooling.
#[derive(Debug, Clone, Copy)]
pub struct CaseInfo<'a> {
    pub id: CaseId,
    pub name: &'a str,
    pub kind: CaseKind,
    pub options: &'a CaseOptions,
}

/// The set of cases for one run, in registration order.
#[derive(Default)]
pub struct HarnessContext {
    cases: Vec<TestCase>,
    names: HashSet<String>,
}

impl HarnessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a case. Names must be non-empty and unique in the run.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        options: CaseOptions,
        body: CaseBody,
    ) -> Result<CaseId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::EmptyCaseName);
        }
        if !self.names.insert(name.clone()) {
            return Err(Error::DuplicateCase(name));
        }
        let id = CaseId(self.cases.len());
        tracing::trace!(case = %name, kind = ?body.kind(), %id, "Registered case");
        self.cases.push(TestCase {
            name,
            options,
            body,
            cleanups: Vec::new(),
        });
        Ok(id)
    }

    pub fn register_synchronous<F>(&mut self, name: impl Into<String>, body: F) -> Result<CaseId>
    where
        F: FnOnce(&TestContext) -> CaseResult + 'static,
    {
        self.register(name, CaseOptions::default(), CaseBody::synchronous(body))
    }

    pub fn register_callback_async<F>(&mut self, name: impl Into<String>, body: F) -> Result<CaseId>
    where
        F: FnOnce(StepController) -> CaseResult + 'static,
    {
        self.register(name, CaseOptions::default(), CaseBody::callback(body))
    }

    pub fn register_promise_based<F, Fut>(&mut self, name: impl Into<String>, body: F) -> Result<CaseId>
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = CaseResult> + 'static,
    {
        self.register(name, CaseOptions::default(), CaseBody::promise(body))
    }

    /// Adds a cleanup to a case before the run starts. These run ahead of
    /// cleanups the body adds itself.
    pub fn add_cleanup<F>(&mut self, id: CaseId, action: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        let case = self.cases.get_mut(id.0).ok_or(Error::UnknownCase(id))?;
        case.cleanups.push(Box::new(action));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn cases(&self) -> impl Iterator<Item = CaseInfo<'_>> {
        self.cases.iter().enumerate().map(|(index, case)| CaseInfo {
            id: CaseId(index),
            name: &case.name,
            kind: case.body.kind(),
            options: &case.options,
        })
    }

    pub(crate) fn into_cases(self) -> Vec<TestCase> {
        self.cases
    }
}

impl fmt::Debug for HarnessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cases()).finish()
    }
}
