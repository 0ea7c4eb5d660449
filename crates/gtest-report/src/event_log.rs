//! Mirrors lifecycle events into the log at debug level

use gtest_runtime::{EventBus, RunEvent, SubscriptionId};

/// Log target of mirrored events
pub const EVENT_TARGET: &str = "gtest::events";

/// Logs one line per lifecycle event
pub struct EventLogger;

impl EventLogger {
    pub fn attach(bus: &EventBus) -> SubscriptionId {
        bus.subscribe(|event| {
            tracing::debug!(target: EVENT_TARGET, event = event.name(), "{}", log_line(event));
        })
    }
}

/// Text logged for `event`
pub fn log_line(event: &RunEvent) -> String {
    match event {
        RunEvent::SuiteAdded(suite) => format!("new suite: {}", suite.full_path()),
        RunEvent::TestAdded(test) => format!("new test: {}", test.description()),
        RunEvent::BeforeAll => "start".to_string(),
        RunEvent::BeforeSuite(suite) => format!("before-suite: {}", suite.path()),
        RunEvent::BeforeTest(test) => format!("before-test: {}", test.description()),
        RunEvent::AfterTest { test, suite } => format!(
            "after-test: {} ({}, {})",
            test.description(),
            suite.full_path(),
            if test.result() { "passed" } else { "failed" }
        ),
        RunEvent::AfterSuite(suite) => format!("after-suite: {}", suite.path()),
        RunEvent::AfterAll => "after".to_string(),
    }
}
