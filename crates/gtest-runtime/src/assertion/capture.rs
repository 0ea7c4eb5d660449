//! The assertion capture handed to a running test

use super::{AssertContext, AssertionOutcome, AssertionRegistry, CallSite, Message, Verdict};
use crate::model::Test;
use serde::Serialize;
use serde_json::Value;
use std::panic::Location;
use std::rc::Rc;

/// Records assertion calls on one test.
///
/// Every call appends an [`AssertionOutcome`] to the test and ANDs its
/// `pass` into the test result. Calls return `pass` so a test can branch on
/// it, but a failure never interrupts the test.
#[derive(Clone)]
pub struct Assert {
    test: Rc<Test>,
    registry: Rc<AssertionRegistry>,
}

impl Assert {
    pub(crate) fn new(test: Rc<Test>, registry: Rc<AssertionRegistry>) -> Self {
        Self { test, registry }
    }

    /// The test this capture records into
    pub fn test(&self) -> &Rc<Test> {
        &self.test
    }

    /// Call the assertion installed as `name`
    #[track_caller]
    pub fn check<I>(&self, name: &str, args: I) -> bool
    where
        I: IntoIterator<Item = Value>,
    {
        let context = AssertContext::new(false, CallSite::from(Location::caller()));
        self.invoke(name, args.into_iter().collect(), context)
    }

    /// `equal(actual, expected)`, decided by `PartialEq`.
    ///
    /// The serialized values are kept as the outcome's `value` and
    /// `expected`. Both sides must be comparable, so values that only share
    /// a JSON shape are rejected:
    ///
    /// ```compile_fail
    /// use gtest_runtime::Harness;
    ///
    /// let harness = Harness::new();
    /// harness
    ///     .describe("floats", |h| async move {
    ///         h.test("nan against unit", |a| async move {
    ///             a.equal(f64::NAN, ());
    ///         })
    ///     })
    ///     .unwrap();
    /// ```
    #[track_caller]
    pub fn equal<A, E>(&self, actual: A, expected: E) -> bool
    where
        A: PartialEq<E> + Serialize,
        E: Serialize,
    {
        let context = AssertContext::new(false, CallSite::from(Location::caller()))
            .with_native_eq(actual == expected);
        self.invoke_serialized("equal", &[&actual, &expected], None, context)
    }

    /// `equal` with a custom description used as the outcome message
    #[track_caller]
    pub fn equal_with<A, E>(&self, actual: A, expected: E, description: &str) -> bool
    where
        A: PartialEq<E> + Serialize,
        E: Serialize,
    {
        let context = AssertContext::new(false, CallSite::from(Location::caller()))
            .with_native_eq(actual == expected);
        self.invoke_serialized("equal", &[&actual, &expected], Some(description), context)
    }

    /// Negated view, consumed by the next call
    pub fn not(&self) -> Not<'_> {
        Not { assert: self }
    }

    fn invoke_serialized(
        &self,
        name: &str,
        args: &[&dyn erased::Serialize],
        description: Option<&str>,
        context: AssertContext,
    ) -> bool {
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            match erased::Serialize::to_json(*arg) {
                Ok(value) => values.push(value),
                Err(err) => {
                    let verdict = Verdict::failed(Message::lazy(move || {
                        format!("could not serialize assertion argument: {}", err)
                    }))
                    .with_stack(context.stack());
                    return self.record(name, context.is_not(), verdict);
                }
            }
        }
        if let Some(description) = description {
            values.push(Value::String(description.to_string()));
        }
        self.invoke(name, values, context)
    }

    fn invoke(&self, name: &str, args: Vec<Value>, context: AssertContext) -> bool {
        let verdict = self.registry.evaluate(name, &context, &args);
        self.record(name, context.is_not(), verdict)
    }

    fn record(&self, name: &str, negated: bool, verdict: Verdict) -> bool {
        let pass = verdict.pass;
        self.test
            .record(AssertionOutcome::from_verdict(name, negated, verdict));
        pass
    }
}

/// Negated view of an [`Assert`]; applies to exactly one call.
pub struct Not<'a> {
    assert: &'a Assert,
}

impl Not<'_> {
    #[track_caller]
    pub fn check<I>(self, name: &str, args: I) -> bool
    where
        I: IntoIterator<Item = Value>,
    {
        let context = AssertContext::new(true, CallSite::from(Location::caller()));
        self.assert
            .invoke(name, args.into_iter().collect(), context)
    }

    #[track_caller]
    pub fn equal<A, E>(self, actual: A, expected: E) -> bool
    where
        A: PartialEq<E> + Serialize,
        E: Serialize,
    {
        let context = AssertContext::new(true, CallSite::from(Location::caller()))
            .with_native_eq(actual == expected);
        self.assert
            .invoke_serialized("equal", &[&actual, &expected], None, context)
    }

    #[track_caller]
    pub fn equal_with<A, E>(self, actual: A, expected: E, description: &str) -> bool
    where
        A: PartialEq<E> + Serialize,
        E: Serialize,
    {
        let context = AssertContext::new(true, CallSite::from(Location::caller()))
            .with_native_eq(actual == expected);
        self.assert
            .invoke_serialized("equal", &[&actual, &expected], Some(description), context)
    }
}

/// Object-safe serialization to JSON for heterogeneous argument lists
mod erased {
    pub trait Serialize {
        fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
    }

    impl<T: serde::Serialize> Serialize for T {
        fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
            serde_json::to_value(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Test;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn capture() -> Assert {
        let test = Rc::new(Test::new("capture", |_assert| async {}));
        Assert::new(test, Rc::new(AssertionRegistry::with_builtins()))
    }

    #[test]
    fn test_records_in_call_order() {
        let assert = capture();
        assert!(assert.equal(1, 1));
        assert!(!assert.equal(1, 2));
        assert!(assert.equal("x", "x"));

        let outcomes = assert.test().asserts();
        let passes: Vec<bool> = outcomes.iter().map(|o| o.pass).collect();
        assert_eq!(passes, vec![true, false, true]);
    }

    #[test]
    fn test_result_is_monotonic() {
        let assert = capture();
        assert.equal(1, 2);
        assert.equal(1, 1);
        assert!(!assert.test().result());
    }

    #[test]
    fn test_not_is_single_use() {
        let assert = capture();
        assert!(assert.not().equal(1, 2));
        assert!(!assert.equal(1, 2));

        let outcomes = assert.test().asserts();
        assert!(outcomes[0].negated);
        assert!(!outcomes[1].negated);
    }

    #[test]
    fn test_call_site_points_at_caller() {
        let assert = capture();
        let line = line!() + 1;
        assert.equal(1, 2);

        let outcomes = assert.test().asserts();
        let stack = outcomes[0].stack.unwrap();
        assert_eq!(stack.line, line);
        assert!(stack.file.ends_with("capture.rs"));
    }

    #[test]
    fn test_check_unknown_is_recorded_failure() {
        let assert = capture();
        assert!(!assert.check("nope", [json!(1)]));
        assert_eq!(assert.test().asserts()[0].name, "nope");
        assert!(!assert.test().result());
    }

    #[test]
    fn test_unserializable_argument_fails() {
        let assert = capture();
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);

        assert!(!assert.equal(&map, &map));
        let outcomes = assert.test().asserts();
        assert!(outcomes[0]
            .message()
            .starts_with("could not serialize assertion argument"));
    }

    #[test]
    fn test_equal_with_description() {
        let assert = capture();
        assert.equal_with(2, 2, "two is two");
        assert_eq!(assert.test().asserts()[0].message(), "two is two");
    }

    #[test]
    fn test_not_equal_with_description() {
        let assert = capture();
        assert!(assert.not().equal_with(2, 3, "two is not three"));
        assert!(!assert.not().equal_with(2, 2, "two is not two"));

        let outcomes = assert.test().asserts();
        assert!(outcomes.iter().all(|o| o.negated));
        assert_eq!(outcomes[0].message(), "two is not three");
        assert_eq!(outcomes[1].message(), "two is not two");
    }

    #[rstest]
    #[case(f64::NAN, f64::NAN, false)]
    #[case(f64::NAN, 0.0, false)]
    #[case(f64::INFINITY, f64::NEG_INFINITY, false)]
    #[case(f64::INFINITY, f64::INFINITY, true)]
    #[case(1.5, 1.5, true)]
    fn test_equal_non_finite_floats(#[case] actual: f64, #[case] expected: f64, #[case] pass: bool) {
        let assert = capture();
        assert_eq!(assert.equal(actual, expected), pass);
        assert_eq!(assert.not().equal(actual, expected), !pass);
    }

    #[rstest]
    #[case(Some(f64::NAN), None)]
    #[case(Some(f64::INFINITY), None)]
    #[case(None, Some(f64::NEG_INFINITY))]
    fn test_non_finite_is_not_none(#[case] actual: Option<f64>, #[case] expected: Option<f64>) {
        let assert = capture();
        assert!(!assert.equal(actual, expected));

        // both sides serialize to null, the diagnostics still show them
        let outcomes = assert.test().asserts();
        assert_eq!(outcomes[0].value, Some(Value::Null));
        assert_eq!(outcomes[0].expected, Some(Value::Null));
    }

    #[test]
    fn test_nan_inside_collections() {
        let assert = capture();
        assert!(!assert.equal(vec![1.0, f64::NAN], vec![1.0, f64::NAN]));
        assert!(assert.equal(vec![1.0, f64::INFINITY], vec![1.0, f64::INFINITY]));
    }

    #[test]
    fn test_check_compares_json() {
        let assert = capture();
        assert!(!assert.check("equal", [json!(2), json!(2.0)]));
        assert!(assert.check("equal", [Value::Null, Value::Null]));
    }
}
