//! Assertion results: verdicts returned by evaluators and the outcomes
//! recorded on a test

use serde::Serialize;
use serde_json::Value;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::panic::Location;

/// Source location of an assertion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl From<&'static Location<'static>> for CallSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Human-readable explanation of an assertion, formatted on first read.
///
/// Evaluators usually hand in a closure so the formatting cost is only paid
/// when a reporter renders the message. The text is cached after the first
/// call to [`Message::get`].
pub struct Message {
    thunk: RefCell<Option<Box<dyn FnOnce() -> String>>>,
    text: OnceCell<String>,
}

impl Message {
    /// Defer formatting until the message is read
    pub fn lazy(format: impl FnOnce() -> String + 'static) -> Self {
        Self {
            thunk: RefCell::new(Some(Box::new(format))),
            text: OnceCell::new(),
        }
    }

    /// An already formatted message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            thunk: RefCell::new(None),
            text: OnceCell::from(text.into()),
        }
    }

    /// Format (once) and return the message
    pub fn get(&self) -> &str {
        self.text.get_or_init(|| {
            self.thunk
                .borrow_mut()
                .take()
                .map(|format| format())
                .unwrap_or_default()
        })
    }

    /// Whether the text has been produced already
    pub fn is_formatted(&self) -> bool {
        self.text.get().is_some()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text.get() {
            Some(text) => f.debug_tuple("Message").field(text).finish(),
            None => f.write_str("Message(<deferred>)"),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::text(text)
    }
}

/// What an evaluator decided for one call.
///
/// `pass` must already have gone through
/// [`AssertContext::apply_modifier`](crate::assertion::AssertContext::apply_modifier).
#[derive(Debug)]
pub struct Verdict {
    pub pass: bool,
    pub message: Message,
    pub expected: Option<Value>,
    pub value: Option<Value>,
    pub stack: Option<CallSite>,
}

impl Verdict {
    pub fn new(pass: bool, message: impl Into<Message>) -> Self {
        Self {
            pass,
            message: message.into(),
            expected: None,
            value: None,
            stack: None,
        }
    }

    pub fn passed(message: impl Into<Message>) -> Self {
        Self::new(true, message)
    }

    pub fn failed(message: impl Into<Message>) -> Self {
        Self::new(false, message)
    }

    pub fn with_expected(mut self, expected: Value) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_stack(mut self, stack: CallSite) -> Self {
        self.stack = Some(stack);
        self
    }
}

/// One recorded assertion call on a test
#[derive(Debug)]
pub struct AssertionOutcome {
    /// Assertion kind that produced this outcome
    pub name: String,
    /// Whether the call went through a negated view
    pub negated: bool,
    pub pass: bool,
    pub message: Message,
    pub expected: Option<Value>,
    pub value: Option<Value>,
    pub stack: Option<CallSite>,
}

/// Assertion name used for outcomes synthesized from a failing callback
pub const CALLBACK_FAILURE: &str = "callback";

impl AssertionOutcome {
    pub(crate) fn from_verdict(name: &str, negated: bool, verdict: Verdict) -> Self {
        Self {
            name: name.to_string(),
            negated,
            pass: verdict.pass,
            message: verdict.message,
            expected: verdict.expected,
            value: verdict.value,
            stack: verdict.stack,
        }
    }

    pub(crate) fn callback_failure(error: String) -> Self {
        Self {
            name: CALLBACK_FAILURE.to_string(),
            negated: false,
            pass: false,
            message: Message::lazy(move || format!("test callback failed: {}", error)),
            expected: None,
            value: None,
            stack: None,
        }
    }

    /// Formatted message of this outcome
    pub fn message(&self) -> &str {
        self.message.get()
    }
}
