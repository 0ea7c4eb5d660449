//! gtest Runtime - test declaration and execution engine
//!
//! This library provides:
//! - Hierarchical suite declaration with asynchronous bodies, registered in
//!   declaration order
//! - Sequential test execution with per-test assertion capture
//! - An extensible assertion protocol with negation and lazy messages
//! - A typed lifecycle event bus for reporters
//!
//! Everything runs on one thread; a [`Harness`] and the futures it drives
//! are `!Send`. Use [`Harness::run_blocking`] from synchronous code, or
//! await [`Harness::start`] inside a `LocalSet`.

/// gtest runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assertion;
pub mod bus;
pub mod error;
pub mod harness;
pub mod model;
pub mod ready;
pub mod state;

mod registry;
mod scheduler;

pub use assertion::{
    Assert, AssertContext, AssertionOutcome, AssertionRegistry, CallSite, Message, Not, Verdict,
    CALLBACK_FAILURE,
};
pub use bus::{EventBus, EventKind, RunEvent, SubscriptionId};
pub use error::{GtestError, GtestResult, RegistrationFailure};
pub use harness::{Harness, HarnessBuilder};
pub use model::{Suite, SuitePath, Test, TestOutput, FULL_PATH_SEPARATOR};
pub use ready::{ReadySignal, ReadyTrigger};
pub use state::{RunPhase, RunState, RunSummary};
