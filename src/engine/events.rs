//! Change notifications the display layers re-render from.
//!
//! An explicit publish/subscribe mechanism: the engine emits an event on
//! each observable mutation and renderers subscribe callbacks. Everything
//! runs on one logical thread, so the bus is a shared callback list, not a
//! channel.

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::SharedTour;

/// A state change worth re-rendering for.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The discovered tour collection was replaced (always as a whole).
    ToursChanged,

    /// The cursor landed on a step: tour started, advanced, or retreated.
    ///
    /// `step` is the index the event was computed for; a renderer should
    /// discard any resolution whose step no longer matches the cursor.
    TourStarted { tour: SharedTour, step: i32 },

    /// The active tour ended. Emitted synchronously before the cursor is
    /// cleared, so listeners still observe the tour being ended.
    TourEnded { tour: SharedTour },
}

type Callback = Rc<dyn Fn(&EngineEvent)>;

/// A subscription handle; pass it back to [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

/// Shared, cloneable event bus. Clones publish to the same subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Subscribers>>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&EngineEvent) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.callbacks.push((id, Rc::new(callback)));
        Subscription(id)
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner
            .borrow_mut()
            .callbacks
            .retain(|(id, _)| *id != subscription.0);
    }

    /// Delivers the event to every subscriber, synchronously and in
    /// subscription order.
    pub fn emit(&self, event: &EngineEvent) {
        // Snapshot outside the borrow so a listener may subscribe or
        // unsubscribe while handling an event.
        let callbacks: Vec<Callback> = {
            let inner = self.inner.borrow();
            inner
                .callbacks
                .iter()
                .map(|(_, callback)| callback.clone())
                .collect()
        };

        for callback in callbacks {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use crate::model::{Tour, shared};

    #[test]
    fn subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = log.clone();
        bus.subscribe(move |_| first.borrow_mut().push("first"));
        let second = log.clone();
        bus.subscribe(move |_| second.borrow_mut().push("second"));

        bus.emit(&EngineEvent::ToursChanged);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let subscription = bus.subscribe(move |_| counter.set(counter.get() + 1));

        bus.emit(&EngineEvent::ToursChanged);
        bus.unsubscribe(subscription);
        bus.emit(&EngineEvent::ToursChanged);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clones_share_subscribers() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        bus.subscribe(move |_| counter.set(counter.get() + 1));

        let tour = shared(Tour::new("T"));
        bus.clone().emit(&EngineEvent::TourEnded { tour });
        assert_eq!(count.get(), 1);
    }
}
