//! Integration tests for the assertion protocol
//!
//! - Custom assertion kinds installed through `extend`
//! - Negation inverts every verdict
//! - Unknown names are recorded failures

use gtest_runtime::{AssertContext, AssertionRegistry, CallSite, Harness, Message, Verdict};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

fn install_greater(harness: &Harness) {
    harness.extend("greater", |ctx, args| {
        let numbers = (
            args.first().and_then(Value::as_f64),
            args.get(1).and_then(Value::as_f64),
        );
        let (value, bound) = match numbers {
            (Some(value), Some(bound)) => (value, bound),
            _ => return Verdict::failed("greater expects two numbers").with_stack(ctx.stack()),
        };
        let pass = ctx.apply_modifier(value > bound);
        let negation = if ctx.is_not() { "not " } else { "" };
        let verdict = Verdict::new(
            pass,
            Message::lazy(move || {
                format!("expected {} {}to be greater than {}", value, negation, bound)
            }),
        );
        if pass {
            verdict
        } else {
            verdict
                .with_value(json!(value))
                .with_expected(json!(bound))
                .with_stack(ctx.stack())
        }
    });
}

#[tokio::test]
async fn test_custom_assertion_through_check() {
    let harness = Harness::new();
    install_greater(&harness);
    harness
        .describe("Numbers", |h| async move {
            h.test("compare", |a| async move {
                a.check("greater", [json!(5), json!(3)]);
                a.not().check("greater", [json!(5), json!(3)]);
                a.not().check("greater", [json!(1), json!(3)]);
            })
        })
        .unwrap();

    let summary = harness.start().await;

    assert_eq!(summary.failed_tests, 1);
    let test = harness.suites()[0].tests()[0].clone();
    let passes: Vec<bool> = test.asserts().iter().map(|o| o.pass).collect();
    assert_eq!(passes, vec![true, false, true]);
    assert_eq!(
        test.asserts()[1].message(),
        "expected 5 not to be greater than 3"
    );
    assert_eq!(test.asserts()[1].expected, Some(json!(3.0)));
}

#[tokio::test]
async fn test_reinstalled_assertion_wins() {
    let harness = Harness::new();
    harness.extend("equal", |ctx, _args| {
        Verdict::new(ctx.apply_modifier(true), "always equal")
    });
    harness
        .describe("S", |h| async move {
            h.test("t", |a| async move {
                a.equal(1, 2);
            })
        })
        .unwrap();

    let summary = harness.start().await;

    assert_eq!(summary.failed_tests, 0);
    assert_eq!(
        harness.suites()[0].tests()[0].asserts()[0].message(),
        "always equal"
    );
}

#[tokio::test]
async fn test_unknown_assertion_is_recorded() {
    let harness = Harness::new();
    harness
        .describe("S", |h| async move {
            h.test("t", |a| async move {
                a.check("contains", [json!([1, 2]), json!(1)]);
                a.equal(1, 1);
            })
        })
        .unwrap();

    let summary = harness.start().await;

    assert_eq!(summary.failed_tests, 1);
    let test = harness.suites()[0].tests()[0].clone();
    assert_eq!(test.asserts().len(), 2);
    assert_eq!(test.asserts()[0].message(), "unknown assertion `contains`");
}

#[derive(Serialize, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[tokio::test]
async fn test_non_finite_floats_fail_the_test() {
    let harness = Harness::new();
    harness
        .describe("Floats", |h| async move {
            h.test("nan", |a| async move {
                a.equal(f64::NAN, f64::NAN);
                a.equal(Some(f64::NAN), None::<f64>);
                a.equal(Some(f64::INFINITY), None::<f64>);
            })
        })
        .unwrap();

    let summary = harness.start().await;

    assert_eq!(summary.failed_tests, 1);
    let test = harness.suites()[0].tests()[0].clone();
    let passes: Vec<bool> = test.asserts().iter().map(|o| o.pass).collect();
    assert_eq!(passes, vec![false, false, false]);
}

#[tokio::test]
async fn test_equal_on_structs() {
    let harness = Harness::new();
    harness
        .describe("S", |h| async move {
            h.test("points", |a| async move {
                a.equal(Point { x: 1, y: 2 }, Point { x: 1, y: 2 });
                a.not().equal(Point { x: 1, y: 2 }, Point { x: 2, y: 1 });
                let point = serde_json::to_value(Point { x: 1, y: 2 })?;
                a.check("equal", [point, json!({"x": 1, "y": 2})]);
                Ok::<(), serde_json::Error>(())
            })
        })
        .unwrap();

    let summary = harness.start().await;
    assert_eq!(summary.failed_tests, 0);
}

#[tokio::test]
async fn test_messages_are_deferred() {
    let harness = Harness::new();
    let formatted = Rc::new(Cell::new(0));
    let counter = Rc::clone(&formatted);
    harness.extend("counted", move |ctx, _args| {
        let counter = Rc::clone(&counter);
        Verdict::new(
            ctx.apply_modifier(true),
            Message::lazy(move || {
                counter.set(counter.get() + 1);
                "counted".to_string()
            }),
        )
    });
    harness
        .describe("S", |h| async move {
            h.test("t", |a| async move {
                a.check("counted", Vec::new());
            })
        })
        .unwrap();

    harness.start().await;
    assert_eq!(formatted.get(), 0);

    let test = harness.suites()[0].tests()[0].clone();
    assert_eq!(test.asserts()[0].message(), "counted");
    assert_eq!(test.asserts()[0].message(), "counted");
    assert_eq!(formatted.get(), 1);
}

fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-z]{0,6}".prop_map(|s| json!(s)),
        Just(Value::Null),
    ]
}

proptest! {
    #[test]
    fn prop_negation_inverts_equal(left in json_scalar(), right in json_scalar()) {
        let harness = Harness::new();
        let plain = Rc::new(Cell::new(None));
        let negated = Rc::new(Cell::new(None));
        let (p, n) = (Rc::clone(&plain), Rc::clone(&negated));

        harness
            .describe("prop", move |h| async move {
                h.test("equal", move |a| async move {
                    p.set(Some(a.check("equal", [left.clone(), right.clone()])));
                    n.set(Some(a.not().check("equal", [left, right])));
                })
            })
            .unwrap();
        harness.run_blocking().unwrap();

        prop_assert_eq!(plain.get().map(|pass| !pass), negated.get());
    }

    #[test]
    fn prop_registry_negation_inverts_custom(value in -100i64..100, bound in -100i64..100) {
        let registry = AssertionRegistry::with_builtins();
        registry.extend("below", |ctx, args| {
            let v = args[0].as_i64().unwrap_or_default();
            let b = args[1].as_i64().unwrap_or_default();
            Verdict::new(ctx.apply_modifier(v < b), "below")
        });

        let site = CallSite { file: "prop.rs", line: 1, column: 1 };
        let args = [json!(value), json!(bound)];
        let plain = registry.evaluate("below", &AssertContext::new(false, site), &args);
        let negated = registry.evaluate("below", &AssertContext::new(true, site), &args);

        prop_assert_eq!(plain.pass, !negated.pass);
    }
}
