//! Console reporter - display test results as they finish

use colored::{Color, Colorize};
use gtest_runtime::{EventBus, RunEvent, RunPhase, RunState, SubscriptionId, Suite, Test};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

/// Console reporter with output configuration
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    /// Show one line per test instead of dots
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Report every finished test of `bus` to `out`
    pub fn attach<W: Write + 'static>(self, bus: &EventBus, out: W) -> SubscriptionId {
        let session = Rc::new(Session {
            reporter: self,
            out: RefCell::new(out),
            finished: RefCell::new(Vec::new()),
        });
        bus.subscribe(move |event| session.handle(event))
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.color(color).to_string()
        }
    }

    fn paint_bold(&self, text: &str, color: Color) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.color(color).bold().to_string()
        }
    }
}

struct Finished {
    suite: Rc<Suite>,
    test: Rc<Test>,
}

struct Session<W> {
    reporter: ConsoleReporter,
    out: RefCell<W>,
    finished: RefCell<Vec<Finished>>,
}

impl<W: Write> Session<W> {
    fn handle(&self, event: &RunEvent) {
        let result = match event {
            RunEvent::AfterTest { test, suite } => self.test_finished(suite, test),
            RunEvent::AfterAll => self.run_finished(),
            _ => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "console reporter could not write");
        }
    }

    fn test_finished(&self, suite: &Rc<Suite>, test: &Rc<Test>) -> io::Result<()> {
        self.print_test_result(suite, test)?;
        self.finished.borrow_mut().push(Finished {
            suite: Rc::clone(suite),
            test: Rc::clone(test),
        });
        Ok(())
    }

    fn run_finished(&self) -> io::Result<()> {
        let finished = self.finished.borrow();
        let mut out = self.out.borrow_mut();

        // Newline before summary if not verbose (dots need newline)
        if !self.reporter.verbose && !finished.is_empty() {
            writeln!(out)?;
        }
        writeln!(out)?;
        self.print_summary(&mut *out, &finished)?;
        self.print_failures(&mut *out, &finished)?;
        out.flush()
    }

    fn print_test_result(&self, suite: &Suite, test: &Test) -> io::Result<()> {
        let r = &self.reporter;
        let mut out = self.out.borrow_mut();
        let passed = test.result();

        if r.verbose {
            let status = if passed {
                r.paint_bold("PASS", Color::Green)
            } else {
                r.paint_bold("FAIL", Color::Red)
            };
            writeln!(out, "{} {}: {}", status, suite.full_path(), test.description())
        } else {
            let mark = if passed {
                r.paint(".", Color::Green)
            } else {
                r.paint_bold("F", Color::Red)
            };
            write!(out, "{}", mark)?;
            out.flush()
        }
    }

    fn print_summary(&self, out: &mut W, finished: &[Finished]) -> io::Result<()> {
        let r = &self.reporter;
        let total = finished.len();
        let failed = finished.iter().filter(|f| !f.test.result()).count();
        let total_duration: Duration = finished.iter().filter_map(|f| f.test.duration()).sum();

        writeln!(out, "{}", "─".repeat(50))?;

        let status = if failed > 0 {
            r.paint_bold("FAILED", Color::Red)
        } else {
            r.paint_bold("PASSED", Color::Green)
        };
        writeln!(
            out,
            "Test result: {} | {}",
            status,
            completion_line(total, failed)
        )?;
        writeln!(out, "Time: {:.2?}", total_duration)
    }

    fn print_failures(&self, out: &mut W, finished: &[Finished]) -> io::Result<()> {
        let r = &self.reporter;
        let failures: Vec<&Finished> = finished.iter().filter(|f| !f.test.result()).collect();
        if failures.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", r.paint_bold("Failures:", Color::Red))?;
        writeln!(out)?;

        for failure in failures {
            writeln!(
                out,
                "  {} {}: {}",
                r.paint("●", Color::Red),
                failure.suite.full_path(),
                failure.test.description()
            )?;

            for (index, outcome) in failure.test.asserts().iter().enumerate() {
                let line = format!("{}. {}", index + 1, outcome.message());
                if outcome.pass {
                    writeln!(out, "    {}", r.paint(&line, Color::Green))?;
                    continue;
                }
                writeln!(out, "    {}", r.paint(&line, Color::Red))?;
                if let Some(expected) = &outcome.expected {
                    writeln!(out, "       expected: {}", expected)?;
                }
                if let Some(value) = &outcome.value {
                    writeln!(out, "       actual:   {}", value)?;
                }
                if let Some(stack) = &outcome.stack {
                    writeln!(out, "       at {}", stack)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// `"N tests completed, with M failed"`
pub fn completion_line(done: usize, failed: usize) -> String {
    format!("{} tests completed, with {} failed", done, failed)
}

/// One-line status of a run, suited to a status bar.
///
/// Before the run starts the counts cover registered suites only. Suite
/// bodies run during `settle()` or `start()`, so call
/// [`Harness::settle`](gtest_runtime::Harness::settle) first to show the
/// declared tests.
pub fn status_line(state: &RunState) -> String {
    match state.phase() {
        RunPhase::Idle => format!(
            "{} suites, with {} tests",
            state.suite_number(),
            state.test_number()
        ),
        RunPhase::Running => format!(
            "{} of {} tests done, with {} failed",
            state.done_test_number(),
            state.test_number(),
            state.failed_test_number()
        ),
        RunPhase::Completed => {
            completion_line(state.done_test_number(), state.failed_test_number())
        }
    }
}
