//! Machine-readable run results

use gtest_runtime::{
    AssertionOutcome, EventBus, EventKind, RunEvent, SubscriptionId, Suite, Test,
};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// One assertion call in a [`TestRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertRecord {
    pub name: String,
    pub pass: bool,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<&AssertionOutcome> for AssertRecord {
    fn from(outcome: &AssertionOutcome) -> Self {
        Self {
            name: outcome.name.clone(),
            pass: outcome.pass,
            message: outcome.message().to_string(),
            negated: outcome.negated,
            expected: outcome.expected.clone(),
            actual: outcome.value.clone(),
            location: outcome.stack.map(|site| site.to_string()),
        }
    }
}

/// One finished test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRecord {
    pub suite: String,
    pub description: String,
    pub passed: bool,
    pub duration_ms: f64,
    pub asserts: Vec<AssertRecord>,
}

impl TestRecord {
    fn new(suite: &Suite, test: &Test) -> Self {
        Self {
            suite: suite.full_path().to_string(),
            description: test.description().to_string(),
            passed: test.result(),
            duration_ms: test
                .duration()
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or_default(),
            asserts: test.asserts().iter().map(AssertRecord::from).collect(),
        }
    }
}

/// Totals plus every [`TestRecord`], in execution order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<TestRecord>,
}

/// Collects a [`TestRecord`] for every `after-test` event
#[derive(Debug, Default)]
pub struct JsonCollector {
    results: RefCell<Vec<TestRecord>>,
}

impl JsonCollector {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn attach(self: &Rc<Self>, bus: &EventBus) -> SubscriptionId {
        let collector = Rc::clone(self);
        bus.on(EventKind::AfterTest, move |event| {
            if let RunEvent::AfterTest { test, suite } = event {
                collector.results.borrow_mut().push(TestRecord::new(suite, test));
            }
        })
    }

    /// Like [`attach`](Self::attach), and also writes the rendered report
    /// to `out` on `after-all`
    pub fn attach_with_output<W: Write + 'static>(
        self: &Rc<Self>,
        bus: &EventBus,
        out: W,
    ) -> Vec<SubscriptionId> {
        let collector = Rc::clone(self);
        let out = RefCell::new(out);
        let writer = bus.on(EventKind::AfterAll, move |_| {
            if let Err(err) = collector.write_to(&mut *out.borrow_mut()) {
                tracing::warn!(error = %err, "could not write JSON report");
            }
        });
        vec![self.attach(bus), writer]
    }

    pub fn report(&self) -> RunReport {
        let results = self.results.borrow().clone();
        let passed = results.iter().filter(|r| r.passed).count();
        RunReport {
            tests: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.report())?;
        writeln!(out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SharedBuffer;
    use gtest_runtime::Harness;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn harness() -> Harness {
        let harness = Harness::new();
        harness
            .describe("Math", |h| async move {
                h.test("adds", |a| async move {
                    a.equal(1 + 1, 2);
                })?;
                h.test("fails", |a| async move {
                    a.equal(1 + 1, 3);
                })
            })
            .unwrap();
        harness
    }

    #[test]
    fn test_report_totals() {
        let harness = harness();
        let collector = JsonCollector::new();
        collector.attach(harness.bus());
        harness.run_blocking().unwrap();

        let report = collector.report();
        assert_eq!(report.tests, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results[1].suite, "Math");
        assert_eq!(report.results[1].asserts[0].expected, Some(json!(3)));
        assert_eq!(report.results[1].asserts[0].actual, Some(json!(2)));
    }

    #[test]
    fn test_passing_assert_omits_diagnostics() {
        let harness = harness();
        let collector = JsonCollector::new();
        collector.attach(harness.bus());
        harness.run_blocking().unwrap();

        let value: Value = serde_json::from_str(&collector.to_json().unwrap()).unwrap();
        assert_eq!(
            value["results"][0]["asserts"][0],
            json!({"name": "equal", "pass": true, "message": "values are equal"})
        );
    }

    #[test]
    fn test_written_on_after_all() {
        let harness = harness();
        let collector = JsonCollector::new();
        let buffer = SharedBuffer::new();
        collector.attach_with_output(harness.bus(), buffer.clone());

        assert!(buffer.is_empty());
        harness.run_blocking().unwrap();

        let value: Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(value["tests"], 2);
        assert_eq!(value["failed"], 1);
    }
}
