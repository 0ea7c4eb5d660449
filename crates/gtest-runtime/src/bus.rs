//! Per-run lifecycle event bus
//!
//! Dispatch is synchronous: [`EventBus::emit`] calls every handler that was
//! subscribed when the emission started, in subscription order, before
//! returning. Handlers subscribed during a dispatch see the next emission.

use crate::model::{Suite, Test};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// One lifecycle notification with its payload
#[derive(Debug, Clone)]
pub enum RunEvent {
    SuiteAdded(Rc<Suite>),
    TestAdded(Rc<Test>),
    BeforeAll,
    BeforeSuite(Rc<Suite>),
    BeforeTest(Rc<Test>),
    AfterTest { test: Rc<Test>, suite: Rc<Suite> },
    AfterSuite(Rc<Suite>),
    AfterAll,
}

impl RunEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::SuiteAdded(_) => EventKind::SuiteAdded,
            RunEvent::TestAdded(_) => EventKind::TestAdded,
            RunEvent::BeforeAll => EventKind::BeforeAll,
            RunEvent::BeforeSuite(_) => EventKind::BeforeSuite,
            RunEvent::BeforeTest(_) => EventKind::BeforeTest,
            RunEvent::AfterTest { .. } => EventKind::AfterTest,
            RunEvent::AfterSuite(_) => EventKind::AfterSuite,
            RunEvent::AfterAll => EventKind::AfterAll,
        }
    }

    /// Channel name, e.g. `"after-test"`
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::SuiteAdded(suite)
            | RunEvent::BeforeSuite(suite)
            | RunEvent::AfterSuite(suite) => write!(f, "{}: {}", self.name(), suite.full_path()),
            RunEvent::TestAdded(test) | RunEvent::BeforeTest(test) => {
                write!(f, "{}: {}", self.name(), test.description())
            }
            RunEvent::AfterTest { test, suite } => write!(
                f,
                "{}: {} > {}",
                self.name(),
                suite.full_path(),
                test.description()
            ),
            RunEvent::BeforeAll | RunEvent::AfterAll => f.write_str(self.name()),
        }
    }
}

/// Event channel, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SuiteAdded,
    TestAdded,
    BeforeAll,
    BeforeSuite,
    BeforeTest,
    AfterTest,
    AfterSuite,
    AfterAll,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::SuiteAdded,
        EventKind::TestAdded,
        EventKind::BeforeAll,
        EventKind::BeforeSuite,
        EventKind::BeforeTest,
        EventKind::AfterTest,
        EventKind::AfterSuite,
        EventKind::AfterAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::SuiteAdded => "suite-added",
            EventKind::TestAdded => "test-added",
            EventKind::BeforeAll => "before-all",
            EventKind::BeforeSuite => "before-suite",
            EventKind::BeforeTest => "before-test",
            EventKind::AfterTest => "after-test",
            EventKind::AfterSuite => "after-suite",
            EventKind::AfterAll => "after-all",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Handler = Rc<dyn Fn(&RunEvent)>;

/// Handle returned by [`EventBus::subscribe`] and [`EventBus::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    kind: Option<EventKind>,
    handler: Handler,
}

/// Typed publish/subscribe dispatcher owned by one harness
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
    counts: RefCell<BTreeMap<EventKind, usize>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            counts: RefCell::new(BTreeMap::new()),
        }
    }

    /// Receive every event
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&RunEvent) + 'static,
    {
        self.add(None, Rc::new(handler))
    }

    /// Receive events of one kind
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&RunEvent) + 'static,
    {
        self.add(Some(kind), Rc::new(handler))
    }

    /// Remove a handler. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Emissions per kind so far
    pub fn event_counts(&self) -> BTreeMap<EventKind, usize> {
        self.counts.borrow().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.counts.borrow().get(&kind).copied().unwrap_or(0)
    }

    pub(crate) fn emit(&self, event: RunEvent) {
        let kind = event.kind();
        *self.counts.borrow_mut().entry(kind).or_insert(0) += 1;

        // Snapshot so handlers can subscribe or unsubscribe while we dispatch
        let handlers: Vec<Handler> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == kind))
            .map(|s| Rc::clone(&s.handler))
            .collect();

        for handler in handlers {
            handler(&event);
        }
    }

    fn add(&self, kind: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber { id, kind, handler });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("counts", &*self.counts.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder(bus: &EventBus) -> Rc<RefCell<Vec<&'static str>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(event.name()));
        seen
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = EventKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = Rc::clone(&order);
            bus.subscribe(move |_| order.borrow_mut().push(n));
        }

        bus.emit(RunEvent::BeforeAll);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_on_filters_by_kind() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        bus.on(EventKind::AfterAll, move |_| counter.set(counter.get() + 1));

        bus.emit(RunEvent::BeforeAll);
        bus.emit(RunEvent::AfterAll);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let seen = recorder(&bus);
        let id = bus.subscribe(|_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        bus.emit(RunEvent::BeforeAll);
        assert_eq!(*seen.borrow(), vec!["before-all"]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_subscribe_during_dispatch_sees_next_event() {
        let bus = Rc::new(EventBus::new());
        let late = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&bus);
        let late_hits = Rc::clone(&late);
        bus.on(EventKind::BeforeAll, move |_| {
            if let Some(bus) = weak.upgrade() {
                let hits = Rc::clone(&late_hits);
                bus.subscribe(move |_| hits.set(hits.get() + 1));
            }
        });

        bus.emit(RunEvent::BeforeAll);
        assert_eq!(late.get(), 0);
        bus.emit(RunEvent::AfterAll);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn test_counts_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(RunEvent::BeforeAll);
        bus.emit(RunEvent::AfterAll);
        bus.emit(RunEvent::AfterAll);

        assert_eq!(bus.count(EventKind::AfterAll), 2);
        assert_eq!(bus.count(EventKind::BeforeTest), 0);
        assert_eq!(bus.event_counts().len(), 2);
    }

    #[test]
    fn test_display_includes_payload() {
        let suite = Rc::new(Suite::new(1, "B".into(), "A > B".into()));
        assert_eq!(
            RunEvent::BeforeSuite(suite).to_string(),
            "before-suite: A > B"
        );
        assert_eq!(RunEvent::AfterAll.to_string(), "after-all");
    }
}
