//! Registration engine
//!
//! `describe` never runs a suite body directly. It enqueues a pending unit
//! on the frame of the suite currently being registered (or on the root
//! frame). A single consumer pops units front to back; for each one it
//! opens the suite, runs the body to completion, then drains the frame the
//! body filled before moving on. Suites are therefore numbered and queued
//! for execution in source preorder, whatever the bodies await.

use crate::bus::RunEvent;
use crate::error::{panic_message, GtestError, GtestResult, RegistrationFailure};
use crate::harness::Harness;
use crate::model::{Suite, SuitePath, Test, FULL_PATH_SEPARATOR};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

pub(crate) type SuiteBody = Box<dyn FnOnce(Harness) -> LocalBoxFuture<'static, GtestResult<()>>>;

struct PendingSuite {
    label: String,
    body: SuiteBody,
}

pub(crate) struct Registrar {
    /// Pending units; the last frame belongs to the suite being registered
    frames: RefCell<Vec<VecDeque<PendingSuite>>>,
    /// Suites whose body or children are still being registered
    nesting: RefCell<Vec<Rc<Suite>>>,
    suites: RefCell<Vec<Rc<Suite>>>,
    run_queue: RefCell<VecDeque<Rc<Suite>>>,
    failures: RefCell<Vec<RegistrationFailure>>,
    next_id: Cell<u64>,
    draining: Cell<bool>,
}

impl Registrar {
    pub(crate) fn new() -> Self {
        Self {
            frames: RefCell::new(vec![VecDeque::new()]),
            nesting: RefCell::new(Vec::new()),
            suites: RefCell::new(Vec::new()),
            run_queue: RefCell::new(VecDeque::new()),
            failures: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            draining: Cell::new(false),
        }
    }

    pub(crate) fn suites(&self) -> Vec<Rc<Suite>> {
        self.suites.borrow().clone()
    }

    pub(crate) fn failures(&self) -> Vec<RegistrationFailure> {
        self.failures.borrow().clone()
    }

    /// Units waiting in any frame
    pub(crate) fn pending(&self) -> usize {
        self.frames.borrow().iter().map(VecDeque::len).sum()
    }

    pub(crate) fn next_suite(&self) -> Option<Rc<Suite>> {
        self.run_queue.borrow_mut().pop_front()
    }

    fn current(&self) -> Option<Rc<Suite>> {
        self.nesting.borrow().last().cloned()
    }

    fn enqueue(&self, label: String, body: SuiteBody) {
        let mut frames = self.frames.borrow_mut();
        match frames.last_mut() {
            Some(frame) => frame.push_back(PendingSuite { label, body }),
            None => frames.push(VecDeque::from([PendingSuite { label, body }])),
        }
    }

    fn pop_pending(&self) -> Option<PendingSuite> {
        self.frames.borrow_mut().last_mut()?.pop_front()
    }

    fn open(&self, label: String) -> Rc<Suite> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let full_path = {
            let nesting = self.nesting.borrow();
            let mut labels: Vec<&str> = nesting.iter().map(|s| s.path()).collect();
            labels.push(&label);
            labels.join(FULL_PATH_SEPARATOR)
        };

        let suite = Rc::new(Suite::new(id, label, full_path));
        self.suites.borrow_mut().push(Rc::clone(&suite));
        self.run_queue.borrow_mut().push_back(Rc::clone(&suite));
        self.nesting.borrow_mut().push(Rc::clone(&suite));
        self.frames.borrow_mut().push(VecDeque::new());
        suite
    }

    fn close(&self) {
        self.frames.borrow_mut().pop();
        self.nesting.borrow_mut().pop();
    }
}

/// Clears the draining flag even if the settle future is dropped mid-way
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Pops the frame and nesting entry pushed by `open`, including when the
/// registering future is dropped while the body is suspended.
struct OpenSuite<'a>(&'a Registrar);

impl Drop for OpenSuite<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub(crate) fn describe<F, Fut>(
    harness: &Harness,
    path: impl Into<SuitePath>,
    body: F,
) -> GtestResult<()>
where
    F: FnOnce(Harness) -> Fut + 'static,
    Fut: Future<Output = GtestResult<()>> + 'static,
{
    let mut labels = path.into().into_labels();
    let mut label = labels.pop().ok_or(GtestError::EmptySuitePath)?;
    let mut body: SuiteBody = Box::new(move |h: Harness| async move { body(h).await }.boxed_local());

    // ["A", "B", "C"] becomes describe A { describe B { describe C { body } } }
    while let Some(outer) = labels.pop() {
        let inner_label = label;
        let inner_body = body;
        body = Box::new(move |h: Harness| -> LocalBoxFuture<'static, GtestResult<()>> {
            async move {
                h.registrar().enqueue(inner_label, inner_body);
                Ok(())
            }
            .boxed_local()
        });
        label = outer;
    }

    tracing::trace!(suite = %label, "suite enqueued");
    harness.registrar().enqueue(label, body);
    Ok(())
}

pub(crate) fn add_test(harness: &Harness, test: Test) -> GtestResult<()> {
    let suite = harness
        .registrar()
        .current()
        .ok_or_else(|| GtestError::DeclarationContext {
            description: test.description().to_string(),
        })?;

    let test = Rc::new(test);
    suite.push_test(Rc::clone(&test));
    harness.state().test_registered();
    tracing::debug!(suite = %suite.full_path(), test = %test.description(), "test added");
    harness.bus().emit(RunEvent::TestAdded(test));
    Ok(())
}

/// Process every pending unit. Returns at once when a drain is already in
/// progress further up the stack.
pub(crate) async fn settle(harness: &Harness) {
    let registrar = harness.registrar();
    if registrar.draining.replace(true) {
        return;
    }
    let _guard = DrainGuard(&registrar.draining);
    drain_frame(harness).await;
}

fn drain_frame(harness: &Harness) -> LocalBoxFuture<'_, ()> {
    async move {
        while let Some(pending) = harness.registrar().pop_pending() {
            register_suite(harness, pending).await;
        }
    }
    .boxed_local()
}

async fn register_suite(harness: &Harness, pending: PendingSuite) {
    let registrar = harness.registrar();
    let suite = registrar.open(pending.label);
    let _open = OpenSuite(registrar);
    harness.state().suite_registered();
    tracing::debug!(id = suite.id(), suite = %suite.full_path(), "suite added");
    harness.bus().emit(RunEvent::SuiteAdded(Rc::clone(&suite)));

    let outcome = AssertUnwindSafe((pending.body)(harness.clone()))
        .catch_unwind()
        .await;
    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(payload) => Some(panic_message(payload)),
    };
    if let Some(message) = failure {
        tracing::warn!(suite = %suite.full_path(), error = %message, "suite body failed");
        registrar.failures.borrow_mut().push(RegistrationFailure {
            suite: suite.full_path().to_string(),
            message,
        });
    }

    drain_frame(harness).await;
}
