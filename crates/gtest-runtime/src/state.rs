//! Run state: counters and lifecycle phase of one harness

use serde::Serialize;
use std::cell::Cell;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Declarations are being collected
    Idle,
    /// The scheduler is draining the run queue
    Running,
    /// `after-all` has been emitted
    Completed,
}

/// Counters for one run.
///
/// Registration counters are written by the registration engine, completion
/// counters by the scheduler. Counters never decrease.
#[derive(Debug)]
pub struct RunState {
    suite_number: Cell<usize>,
    test_number: Cell<usize>,
    done_test_number: Cell<usize>,
    failed_test_number: Cell<usize>,
    done_suite_number: Cell<usize>,
    started: Cell<bool>,
    phase: Cell<RunPhase>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            suite_number: Cell::new(0),
            test_number: Cell::new(0),
            done_test_number: Cell::new(0),
            failed_test_number: Cell::new(0),
            done_suite_number: Cell::new(0),
            started: Cell::new(false),
            phase: Cell::new(RunPhase::Idle),
        }
    }

    /// Suites registered so far
    pub fn suite_number(&self) -> usize {
        self.suite_number.get()
    }

    /// Tests registered so far
    pub fn test_number(&self) -> usize {
        self.test_number.get()
    }

    /// Tests whose callback has finished
    pub fn done_test_number(&self) -> usize {
        self.done_test_number.get()
    }

    /// Finished tests with `result == false`
    pub fn failed_test_number(&self) -> usize {
        self.failed_test_number.get()
    }

    /// Suites whose tests have all finished
    pub fn done_suite_number(&self) -> usize {
        self.done_suite_number.get()
    }

    /// True from the first execution tick on
    pub fn started(&self) -> bool {
        self.started.get()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase.get()
    }

    /// Snapshot of the counters
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            suites: self.suite_number(),
            tests: self.test_number(),
            done_tests: self.done_test_number(),
            failed_tests: self.failed_test_number(),
            done_suites: self.done_suite_number(),
            phase: self.phase(),
        }
    }

    pub(crate) fn suite_registered(&self) {
        self.suite_number.set(self.suite_number.get() + 1);
    }

    pub(crate) fn test_registered(&self) {
        self.test_number.set(self.test_number.get() + 1);
    }

    pub(crate) fn begin(&self) {
        self.started.set(true);
        self.phase.set(RunPhase::Running);
    }

    pub(crate) fn test_done(&self, passed: bool) {
        self.done_test_number.set(self.done_test_number.get() + 1);
        if !passed {
            self.failed_test_number
                .set(self.failed_test_number.get() + 1);
        }
        debug_assert!(self.done_test_number() <= self.test_number());
        debug_assert!(self.failed_test_number() <= self.done_test_number());
    }

    pub(crate) fn suite_done(&self) {
        self.done_suite_number
            .set(self.done_suite_number.get() + 1);
    }

    pub(crate) fn complete(&self) {
        self.phase.set(RunPhase::Completed);
    }
}

/// Serializable snapshot of [`RunState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub suites: usize,
    pub tests: usize,
    pub done_tests: usize,
    pub failed_tests: usize,
    pub done_suites: usize,
    pub phase: RunPhase,
}

impl RunSummary {
    pub fn passed_tests(&self) -> usize {
        self.done_tests - self.failed_tests
    }

    /// True when the run completed without a failed test
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Completed && self.failed_tests == 0
    }

    /// Process exit code for callers that turn a run into a process status
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
