//! Suite and test records

use crate::assertion::{Assert, AssertionOutcome};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

/// Separator between suite labels in [`Suite::full_path`]
pub const FULL_PATH_SEPARATOR: &str = " > ";

pub(crate) type TestCallback = Box<dyn FnOnce(Assert) -> LocalBoxFuture<'static, Result<(), String>>>;

/// Values a test callback may resolve to.
///
/// `()` always succeeds; `Err` from a `Result` marks the test as failed.
pub trait TestOutput {
    fn into_failure(self) -> Option<String>;
}

impl TestOutput for () {
    fn into_failure(self) -> Option<String> {
        None
    }
}

impl<E: fmt::Display> TestOutput for Result<(), E> {
    fn into_failure(self) -> Option<String> {
        self.err().map(|err| err.to_string())
    }
}

/// A registered suite
pub struct Suite {
    id: u64,
    path: String,
    full_path: String,
    tests: RefCell<Vec<Rc<Test>>>,
}

impl Suite {
    pub(crate) fn new(id: u64, path: String, full_path: String) -> Self {
        Self {
            id,
            path,
            full_path,
            tests: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Label given to `describe`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Labels of all enclosing suites and this one, joined with `" > "`
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Tests in declaration order
    pub fn tests(&self) -> Vec<Rc<Test>> {
        self.tests.borrow().clone()
    }

    pub fn test_count(&self) -> usize {
        self.tests.borrow().len()
    }

    pub(crate) fn push_test(&self, test: Rc<Test>) {
        self.tests.borrow_mut().push(test);
    }

    pub(crate) fn test_at(&self, index: usize) -> Option<Rc<Test>> {
        self.tests.borrow().get(index).cloned()
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("full_path", &self.full_path)
            .field("tests", &self.test_count())
            .finish()
    }
}

/// A registered test
pub struct Test {
    description: String,
    callback: RefCell<Option<TestCallback>>,
    asserts: RefCell<Vec<AssertionOutcome>>,
    result: Cell<bool>,
    duration: Cell<Option<Duration>>,
}

impl Test {
    pub(crate) fn new<F, Fut>(description: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(Assert) -> Fut + 'static,
        Fut: Future + 'static,
        Fut::Output: TestOutput,
    {
        let callback: TestCallback = Box::new(move |assert| {
            async move {
                match callback(assert).await.into_failure() {
                    Some(failure) => Err(failure),
                    None => Ok(()),
                }
            }
            .boxed_local()
        });

        Self {
            description: description.into(),
            callback: RefCell::new(Some(callback)),
            asserts: RefCell::new(Vec::new()),
            result: Cell::new(true),
            duration: Cell::new(None),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// False once any recorded outcome failed
    pub fn result(&self) -> bool {
        self.result.get()
    }

    /// Outcomes in call order
    pub fn asserts(&self) -> Ref<'_, [AssertionOutcome]> {
        Ref::map(self.asserts.borrow(), Vec::as_slice)
    }

    pub fn failed_asserts(&self) -> usize {
        self.asserts.borrow().iter().filter(|o| !o.pass).count()
    }

    /// Time spent in the callback, once it has run
    pub fn duration(&self) -> Option<Duration> {
        self.duration.get()
    }

    /// Whether the scheduler has taken the callback
    pub fn has_run(&self) -> bool {
        self.callback.borrow().is_none()
    }

    pub(crate) fn record(&self, outcome: AssertionOutcome) {
        self.result.set(self.result.get() && outcome.pass);
        self.asserts.borrow_mut().push(outcome);
    }

    pub(crate) fn take_callback(&self) -> Option<TestCallback> {
        self.callback.borrow_mut().take()
    }

    pub(crate) fn set_duration(&self, duration: Duration) {
        self.duration.set(Some(duration));
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("description", &self.description)
            .field("result", &self.result.get())
            .field("asserts", &self.asserts.borrow().len())
            .finish()
    }
}

/// Label chain accepted by `describe`.
///
/// One label declares one suite; several labels declare a chain of nested
/// suites, the last one receiving the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePath(Vec<String>);

impl SuitePath {
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub(crate) fn into_labels(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for SuitePath {
    fn from(label: &str) -> Self {
        SuitePath(vec![label.to_string()])
    }
}

impl From<String> for SuitePath {
    fn from(label: String) -> Self {
        SuitePath(vec![label])
    }
}

impl From<&[&str]> for SuitePath {
    fn from(labels: &[&str]) -> Self {
        SuitePath(labels.iter().map(|l| l.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SuitePath {
    fn from(labels: [&str; N]) -> Self {
        SuitePath(labels.iter().map(|l| l.to_string()).collect())
    }
}

impl From<Vec<String>> for SuitePath {
    fn from(labels: Vec<String>) -> Self {
        SuitePath(labels)
    }
}

impl From<Vec<&str>> for SuitePath {
    fn from(labels: Vec<&str>) -> Self {
        SuitePath(labels.into_iter().map(str::to_string).collect())
    }
}
