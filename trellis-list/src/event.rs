//! Synchronous, single-threaded change notifications.
//!
//! An [`Event`] keeps an ordered list of listeners. [`Event::emit`] calls
//! every listener registered at the time of the call, in registration order,
//! on the calling thread. [`Event::listen`] returns a [`Subscription`] that
//! removes the listener again when cancelled.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<A> = Rc<RefCell<dyn FnMut(&A)>>;

struct Listeners<A> {
    next_id: u64,
    entries: Vec<(u64, Listener<A>)>,
}

/// Notification emitted by a list adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// The rows were re-synchronized with the source.
    DataChanged { preserve_expansion: bool },
    /// The rows were rebuilt from scratch with all nodes collapsed.
    DataReplaced,
    /// `inserted` rows appeared right after the node at `row`.
    Expanded { row: usize, inserted: usize },
    /// `removed` rows disappeared right after the node at `row`.
    Collapsed { row: usize, removed: usize },
}

/// A list of listeners receiving `&A`.
pub struct Event<A> {
    listeners: Rc<RefCell<Listeners<A>>>,
}

impl<A: 'static> Event<A> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register `listener`. It stays registered until the returned
    /// subscription is cancelled; dropping the subscription keeps it.
    pub fn listen(&self, listener: impl FnMut(&A) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        let listener: Listener<A> = Rc::new(RefCell::new(listener));
        listeners.entries.push((id, listener));

        let weak: Weak<RefCell<Listeners<A>>> = Rc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners
                        .borrow_mut()
                        .entries
                        .retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Call every listener with `args`.
    ///
    /// Listeners may subscribe or cancel while being notified; the set of
    /// listeners called is fixed when `emit` starts.
    ///
    /// # Panics
    ///
    /// Panics if a listener re-emits the event that is currently calling it.
    pub fn emit(&self, args: &A) {
        let snapshot: Vec<Listener<A>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            (&mut *listener.borrow_mut())(args);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: 'static> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

/// Handle returned by [`Event::listen`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unregister the listener. Safe to call after the event was dropped.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn listeners_run_in_registration_order() {
        let event = Event::<u32>::new();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&calls);
        let _a = event.listen(move |value| {
            first.borrow_mut().push(("a", *value));
        });
        let second = Rc::clone(&calls);
        let _b = event.listen(move |value| {
            second.borrow_mut().push(("b", *value));
        });

        event.emit(&7);
        assert_eq!(*calls.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn cancelled_subscription_stops_delivery() {
        let event = Event::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let subscription =
            event.listen(move |_| counter.set(counter.get() + 1));
        event.emit(&());
        subscription.cancel();
        event.emit(&());

        assert_eq!(hits.get(), 1);
        assert!(event.is_empty());
    }

    #[test]
    fn dropping_the_subscription_keeps_the_listener() {
        let event = Event::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        drop(event.listen(move |_| counter.set(counter.get() + 1)));
        event.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(event.len(), 1);
    }

    #[test]
    fn cancel_after_event_dropped_is_a_no_op() {
        let event = Event::<()>::new();
        let subscription = event.listen(|_| {});
        drop(event);
        subscription.cancel();
    }

    #[test]
    fn listener_added_during_emit_runs_next_time() {
        let event = Rc::new(Event::<()>::new());
        let hits = Rc::new(Cell::new(0));

        let inner_event = Rc::clone(&event);
        let inner_hits = Rc::clone(&hits);
        let _outer = event.listen(move |_| {
            let hits = Rc::clone(&inner_hits);
            let _ = inner_event.listen(move |_| hits.set(hits.get() + 1));
        });

        event.emit(&());
        assert_eq!(hits.get(), 0);
        event.emit(&());
        assert_eq!(hits.get(), 1);
    }
}
