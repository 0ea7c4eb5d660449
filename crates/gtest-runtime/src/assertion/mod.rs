//! Assertion protocol
//!
//! Assertion kinds are installed by name with [`AssertionRegistry::extend`].
//! An evaluator receives an [`AssertContext`] and the call arguments as JSON
//! values, and returns a [`Verdict`]. The capture handed to a test
//! ([`Assert`]) records every call on the running test, in call order.
//!
//! Negation is free for evaluators: they compute their raw result and pass
//! it through [`AssertContext::apply_modifier`], which flips it when the
//! call came through [`Assert::not`].
//!
//! # Example
//!
//! ```
//! use gtest_runtime::assertion::{AssertionRegistry, Message, Verdict};
//!
//! let registry = AssertionRegistry::with_builtins();
//! registry.extend("positive", |ctx, args| {
//!     let n = args.first().and_then(|v| v.as_f64()).unwrap_or(0.0);
//!     let pass = ctx.apply_modifier(n > 0.0);
//!     Verdict::new(pass, Message::lazy(move || format!("{} > 0", n)))
//! });
//! assert!(registry.contains("positive"));
//! ```

mod capture;
mod equal;
mod outcome;

pub use capture::{Assert, Not};
pub use outcome::{AssertionOutcome, CallSite, Message, Verdict, CALLBACK_FAILURE};

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Evaluator function for one assertion kind
pub type Evaluator = Rc<dyn Fn(&AssertContext, &[Value]) -> Verdict>;

/// Per-call information handed to an evaluator
#[derive(Debug, Clone, Copy)]
pub struct AssertContext {
    is_not: bool,
    stack: CallSite,
    native_eq: Option<bool>,
}

impl AssertContext {
    pub fn new(is_not: bool, stack: CallSite) -> Self {
        Self {
            is_not,
            stack,
            native_eq: None,
        }
    }

    /// Attach the `PartialEq` result of the caller's own values
    pub fn with_native_eq(mut self, equal: bool) -> Self {
        self.native_eq = Some(equal);
        self
    }

    /// `PartialEq` result of the typed arguments, when the call came from
    /// [`Assert::equal`] or [`Not::equal`] rather than [`Assert::check`].
    ///
    /// JSON cannot tell `NaN` or infinities apart from `null`, so equality
    /// evaluators should prefer this over comparing the serialized values.
    pub fn native_eq(&self) -> Option<bool> {
        self.native_eq
    }

    /// Whether the call came through a negated view
    pub fn is_not(&self) -> bool {
        self.is_not
    }

    /// Where the assertion was called from
    pub fn stack(&self) -> CallSite {
        self.stack
    }

    /// Turn a raw comparison into the final pass value
    pub fn apply_modifier(&self, raw: bool) -> bool {
        raw != self.is_not
    }
}

/// Name → evaluator table. Later registrations replace earlier ones.
pub struct AssertionRegistry {
    evaluators: RefCell<HashMap<String, Evaluator>>,
}

impl Default for AssertionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AssertionRegistry {
    /// A registry with no assertion kinds
    pub fn new() -> Self {
        Self {
            evaluators: RefCell::new(HashMap::new()),
        }
    }

    /// A registry with the built-in `equal`
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.extend(equal::NAME, equal::evaluate);
        registry
    }

    /// Install or overwrite an assertion kind
    pub fn extend<F>(&self, name: impl Into<String>, evaluator: F)
    where
        F: Fn(&AssertContext, &[Value]) -> Verdict + 'static,
    {
        let name = name.into();
        let replaced = self
            .evaluators
            .borrow_mut()
            .insert(name.clone(), Rc::new(evaluator))
            .is_some();
        tracing::debug!(assertion = %name, replaced, "assertion installed");
    }

    pub fn contains(&self, name: &str) -> bool {
        self.evaluators.borrow().contains_key(name)
    }

    /// Installed names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.evaluators.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn get(&self, name: &str) -> Option<Evaluator> {
        self.evaluators.borrow().get(name).cloned()
    }

    /// Evaluate `name` without recording anything
    pub fn evaluate(&self, name: &str, context: &AssertContext, args: &[Value]) -> Verdict {
        match self.get(name) {
            Some(evaluator) => evaluator(context, args),
            None => {
                let name = name.to_string();
                Verdict::failed(Message::lazy(move || {
                    format!("unknown assertion `{}`", name)
                }))
                .with_stack(context.stack())
            }
        }
    }
}

impl fmt::Debug for AssertionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
