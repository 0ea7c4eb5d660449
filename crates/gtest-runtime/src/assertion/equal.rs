//! Built-in `equal(value, expected[, description])`
//!
//! Typed calls are decided by `PartialEq` on the caller's values; the JSON
//! arguments then only feed the diagnostics. Dynamic calls compare the JSON
//! values strictly: `2` and `2.0` differ, as do `"1"` and `1`.

use super::{AssertContext, Message, Verdict};
use serde_json::Value;

pub(crate) const NAME: &str = "equal";

pub(crate) fn evaluate(context: &AssertContext, args: &[Value]) -> Verdict {
    if args.len() < 2 {
        let got = args.len();
        return Verdict::failed(Message::lazy(move || {
            format!("equal expects 2 arguments, got {}", got)
        }))
        .with_stack(context.stack());
    }

    let value = args[0].clone();
    let expected = args[1].clone();
    let description = args.get(2).and_then(Value::as_str).map(str::to_owned);

    let is_not = context.is_not();
    let negation = if is_not { "not " } else { "" };
    let raw = context.native_eq().unwrap_or(value == expected);
    let pass = context.apply_modifier(raw);

    let message = match description {
        Some(text) => Message::text(text),
        None if pass => Message::lazy(move || format!("values are {}equal", negation)),
        None => Message::lazy(move || format!("expected values {}to be equal", negation)),
    };

    if pass {
        Verdict::passed(message)
    } else {
        Verdict::failed(message)
            .with_expected(expected)
            .with_value(value)
            .with_stack(context.stack())
    }
}
