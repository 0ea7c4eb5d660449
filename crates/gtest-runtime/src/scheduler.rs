//! Execution scheduler: runs the queued suites one test at a time

use crate::assertion::{Assert, AssertionOutcome};
use crate::bus::RunEvent;
use crate::error::panic_message;
use crate::harness::Harness;
use crate::model::{Suite, Test};
use crate::state::RunSummary;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use tokio::time::Instant;

/// Drain the run queue front to back.
///
/// Each test callback is awaited to completion before the next one starts.
pub(crate) async fn execute(harness: &Harness) -> RunSummary {
    let state = harness.state();
    let bus = harness.bus();

    state.begin();
    tracing::info!(
        suites = state.suite_number(),
        tests = state.test_number(),
        "run started"
    );
    bus.emit(RunEvent::BeforeAll);

    while let Some(suite) = harness.registrar().next_suite() {
        bus.emit(RunEvent::BeforeSuite(Rc::clone(&suite)));

        let mut index = 0;
        while let Some(test) = suite.test_at(index) {
            run_test(harness, &suite, test).await;
            index += 1;
        }

        state.suite_done();
        bus.emit(RunEvent::AfterSuite(suite));
    }

    state.complete();
    let summary = state.summary();
    tracing::info!(
        tests = summary.done_tests,
        failed = summary.failed_tests,
        suites = summary.done_suites,
        "run completed"
    );
    bus.emit(RunEvent::AfterAll);
    summary
}

async fn run_test(harness: &Harness, suite: &Rc<Suite>, test: Rc<Test>) {
    let state = harness.state();
    harness.bus().emit(RunEvent::BeforeTest(Rc::clone(&test)));

    let started = Instant::now();
    if let Some(callback) = test.take_callback() {
        let assert = Assert::new(Rc::clone(&test), harness.assertions());
        let outcome = AssertUnwindSafe(callback(assert)).catch_unwind().await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(message)) => Some(message),
            Err(payload) => Some(panic_message(payload)),
        };
        if let Some(message) = failure {
            tracing::debug!(test = %test.description(), error = %message, "test callback failed");
            test.record(AssertionOutcome::callback_failure(message));
        }
    }
    test.set_duration(started.elapsed());

    state.test_done(test.result());
    tracing::debug!(
        suite = %suite.full_path(),
        test = %test.description(),
        passed = test.result(),
        "test finished"
    );
    harness.bus().emit(RunEvent::AfterTest {
        test,
        suite: Rc::clone(suite),
    });
}
