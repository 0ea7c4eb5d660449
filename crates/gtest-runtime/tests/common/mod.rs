//! Shared helpers for runtime integration tests

#![allow(dead_code)]

use gtest_runtime::{Harness, RunEvent};
use std::cell::RefCell;
use std::rc::Rc;

/// Collects every event rendered with `Display`, in emission order
pub fn record_events(harness: &Harness) -> Rc<RefCell<Vec<String>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    harness
        .bus()
        .subscribe(move |event: &RunEvent| sink.borrow_mut().push(event.to_string()));
    events
}

/// Only the events whose name is `name`
pub fn events_named(events: &Rc<RefCell<Vec<String>>>, name: &str) -> Vec<String> {
    events
        .borrow()
        .iter()
        .filter(|e| e.split(':').next() == Some(name))
        .cloned()
        .collect()
}

/// Full paths of the harness's suites, registration order
pub fn suite_paths(harness: &Harness) -> Vec<String> {
    harness
        .suites()
        .iter()
        .map(|s| s.full_path().to_string())
        .collect()
}

/// `(full_path, [test descriptions])` per suite
pub fn tree(harness: &Harness) -> Vec<(String, Vec<String>)> {
    harness
        .suites()
        .iter()
        .map(|s| {
            let tests = s
                .tests()
                .iter()
                .map(|t| t.description().to_string())
                .collect();
            (s.full_path().to_string(), tests)
        })
        .collect()
}
