//! The run context: one bus, one assertion registry, one registration
//! engine and one run state

use crate::assertion::{Assert, AssertContext, AssertionRegistry, Verdict};
use crate::bus::EventBus;
use crate::error::{GtestResult, RegistrationFailure};
use crate::model::{Suite, SuitePath, Test, TestOutput};
use crate::ready::ReadySignal;
use crate::registry::{self, Registrar};
use crate::scheduler;
use crate::state::{RunState, RunSummary};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use tokio::task::LocalSet;

struct Inner {
    bus: EventBus,
    state: RunState,
    assertions: Rc<AssertionRegistry>,
    registrar: Registrar,
    ready: RefCell<Option<ReadySignal>>,
    start_requested: Cell<bool>,
}

/// Handle to one run.
///
/// Cloning is cheap and every clone refers to the same run; suite bodies
/// receive a clone to declare tests and nested suites. Harnesses are
/// independent of each other.
///
/// # Example
///
/// ```
/// use gtest_runtime::Harness;
///
/// let harness = Harness::new();
/// harness
///     .describe("Math", |h| async move {
///         h.test("adds", |assert| async move {
///             assert.equal(1 + 1, 2);
///         })
///     })
///     .unwrap();
///
/// let summary = harness.run_blocking().unwrap();
/// assert_eq!(summary.done_tests, 1);
/// assert_eq!(summary.failed_tests, 0);
/// ```
#[derive(Clone)]
pub struct Harness {
    inner: Rc<Inner>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// A harness that is ready to start immediately
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Declare a suite.
    ///
    /// The body is not run here; it is queued and runs during [`settle`]
    /// or [`start`], after every suite declared before it at the same
    /// level. A label chain such as `["A", "B"]` declares `B` nested in
    /// `A`.
    ///
    /// [`settle`]: Harness::settle
    /// [`start`]: Harness::start
    pub fn describe<F, Fut>(&self, path: impl Into<SuitePath>, body: F) -> GtestResult<()>
    where
        F: FnOnce(Harness) -> Fut + 'static,
        Fut: Future<Output = GtestResult<()>> + 'static,
    {
        registry::describe(self, path, body)
    }

    /// Declare a test in the suite whose body is running.
    ///
    /// Fails with [`GtestError::DeclarationContext`](crate::GtestError::DeclarationContext)
    /// when no suite body is running.
    pub fn test<F, Fut>(&self, description: impl Into<String>, callback: F) -> GtestResult<()>
    where
        F: FnOnce(Assert) -> Fut + 'static,
        Fut: Future + 'static,
        Fut::Output: TestOutput,
    {
        registry::add_test(self, Test::new(description, callback))
    }

    /// Install or replace an assertion kind, callable through
    /// [`Assert::check`]
    pub fn extend<F>(&self, name: impl Into<String>, evaluator: F)
    where
        F: Fn(&AssertContext, &[Value]) -> Verdict + 'static,
    {
        self.inner.assertions.extend(name, evaluator);
    }

    /// Run every queued suite body, in declaration order
    pub async fn settle(&self) {
        registry::settle(self).await;
    }

    /// Wait for the ready signal, register everything declared so far, then
    /// run every test once.
    ///
    /// Only the first call runs anything; later calls log a warning and
    /// return the current counters.
    pub async fn start(&self) -> RunSummary {
        if self.inner.start_requested.replace(true) {
            tracing::warn!("start() already called on this harness, ignoring");
            return self.inner.state.summary();
        }

        let ready = self.inner.ready.borrow_mut().take();
        if let Some(ready) = ready {
            ready.wait().await;
        }

        self.settle().await;
        scheduler::execute(self).await
    }

    /// Drive [`start`](Harness::start) on a fresh current-thread runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn run_blocking(&self) -> GtestResult<RunSummary> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let local_set = LocalSet::new();
        Ok(runtime.block_on(local_set.run_until(self.start())))
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn state(&self) -> &RunState {
        &self.inner.state
    }

    pub fn assertions(&self) -> Rc<AssertionRegistry> {
        Rc::clone(&self.inner.assertions)
    }

    /// Every registered suite in registration order, including ones already run
    pub fn suites(&self) -> Vec<Rc<Suite>> {
        self.inner.registrar.suites()
    }

    /// Suite bodies that failed while registering
    pub fn registration_errors(&self) -> Vec<RegistrationFailure> {
        self.inner.registrar.failures()
    }

    /// Suites declared but not registered yet
    pub fn pending_registrations(&self) -> usize {
        self.inner.registrar.pending()
    }

    pub(crate) fn registrar(&self) -> &Registrar {
        &self.inner.registrar
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("summary", &self.inner.state.summary())
            .field("pending", &self.pending_registrations())
            .finish()
    }
}

/// Builder for [`Harness`]
#[derive(Debug, Default)]
pub struct HarnessBuilder {
    ready: ReadySignal,
    assertions: Option<AssertionRegistry>,
}

impl HarnessBuilder {
    /// Signal awaited by `start()` before registering and running
    pub fn ready(mut self, signal: ReadySignal) -> Self {
        self.ready = signal;
        self
    }

    /// Start from a custom assertion registry instead of the built-ins
    pub fn assertions(mut self, registry: AssertionRegistry) -> Self {
        self.assertions = Some(registry);
        self
    }

    pub fn build(self) -> Harness {
        Harness {
            inner: Rc::new(Inner {
                bus: EventBus::new(),
                state: RunState::new(),
                assertions: Rc::new(self.assertions.unwrap_or_default()),
                registrar: Registrar::new(),
                ready: RefCell::new(Some(self.ready)),
                start_requested: Cell::new(false),
            }),
        }
    }
}
