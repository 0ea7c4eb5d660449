//! gtest Reporting
//!
//! Event-bus subscribers for a [`gtest_runtime::Harness`]:
//! - [`ConsoleReporter`]: dots or one line per test, then a summary with
//!   failure details
//! - [`JsonCollector`]: one record per finished test, rendered as JSON
//! - [`EventLogger`]: every lifecycle event mirrored into `tracing`
//!
//! [`attach`] wires the ones selected by a [`gtest_config::Config`].
//!
//! # Example
//!
//! ```
//! use gtest_config::Config;
//! use gtest_report::{attach_to, SharedBuffer};
//! use gtest_runtime::Harness;
//!
//! let harness = Harness::new();
//! harness
//!     .describe("Math", |h| async move {
//!         h.test("adds", |a| async move {
//!             a.equal(1 + 1, 2);
//!         })
//!     })
//!     .unwrap();
//!
//! let output = SharedBuffer::new();
//! attach_to(&harness, &Config::default(), output.clone());
//! harness.run_blocking().unwrap();
//! assert!(output.contents().contains("1 tests completed, with 0 failed"));
//! ```

pub mod buffer;
pub mod console;
pub mod event_log;
pub mod json;
pub mod logging;

pub use buffer::SharedBuffer;
pub use console::{completion_line, status_line, ConsoleReporter};
pub use event_log::EventLogger;
pub use json::{AssertRecord, JsonCollector, RunReport, TestRecord};
pub use logging::init_logging;

use gtest_config::{Config, ReportFormat};
use gtest_runtime::{Harness, SubscriptionId};
use std::io::{self, Write};
use std::rc::Rc;

/// Subscribers installed by [`attach`]
#[derive(Debug, Default)]
pub struct Attached {
    pub subscriptions: Vec<SubscriptionId>,
    /// Present when the configured format is JSON
    pub json: Option<Rc<JsonCollector>>,
}

impl Attached {
    /// Remove every installed subscriber from `harness`
    pub fn detach(self, harness: &Harness) {
        for id in self.subscriptions {
            harness.bus().unsubscribe(id);
        }
    }
}

/// Attach the reporters selected by `config`, writing to stdout.
///
/// Reporters only see events emitted after this call. Suites are counted
/// when their bodies run, so [`status_line`] reads zero until the harness
/// has settled.
pub fn attach(harness: &Harness, config: &Config) -> Attached {
    attach_to(harness, config, io::stdout())
}

/// Attach the reporters selected by `config`, writing to `out`
pub fn attach_to<W: Write + 'static>(harness: &Harness, config: &Config, out: W) -> Attached {
    let bus = harness.bus();
    let mut attached = Attached::default();

    match config.format() {
        ReportFormat::Human => {
            let reporter = ConsoleReporter::new(config.verbose()).with_no_color(config.no_color());
            attached.subscriptions.push(reporter.attach(bus, out));
        }
        ReportFormat::Json => {
            let collector = JsonCollector::new();
            attached
                .subscriptions
                .extend(collector.attach_with_output(bus, out));
            attached.json = Some(collector);
        }
    }

    if config.log_events() {
        attached.subscriptions.push(EventLogger::attach(bus));
    }

    tracing::debug!(
        format = %config.format(),
        subscribers = attached.subscriptions.len(),
        "reporters attached"
    );
    attached
}
