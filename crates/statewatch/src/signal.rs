#![forbid(unsafe_code)]

//! Multicast, replay-latest change signal.
//!
//! # Design
//!
//! [`Signal<T>`] holds the most recently emitted value in shared,
//! reference-counted storage. Subscribers are stored as `Weak` callbacks and
//! cleaned up lazily during notification; [`Subscription`] is the RAII guard
//! that keeps a callback alive and unsubscribes it on drop.
//!
//! Delivery is synchronous and re-entrant within the call stack of the
//! emitter: by the time [`emit()`](Signal::emit) returns, every live
//! subscriber has observed the value.
//!
//! # Invariants
//!
//! 1. A new subscriber's first received value is the latest emitted value at
//!    subscribe time (replay-latest), delivered before `subscribe()` returns.
//! 2. Subscribers are notified in registration order.
//! 3. Every `emit()` notifies, including emissions equal to the current
//!    value. Deduplication is the producer's business, not the signal's.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. The signal never completes and never errors; it only carries values.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: the panic propagates to the emitter;
//!   subscribers registered later are not notified for that emission.
//! - **Signal dropped while subscriptions live**: the subscriptions become
//!   inert; dropping them afterwards is a no-op.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct SignalInner<T> {
    /// Latest emitted value, replayed to new subscribers.
    value: T,
    /// Monotonically increasing emission count.
    version: u64,
    /// Subscriber callbacks in registration order. Dead entries are pruned
    /// lazily at the next emission.
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A multicast, replay-latest value stream.
///
/// Cloning a `Signal` creates a new handle to the **same** underlying
/// stream. Single-threaded by construction (`Rc`/`RefCell`).
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal seeded with `initial`. The seed counts as the first
    /// emission: it is what new subscribers receive until the next `emit()`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value: initial,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Latest emitted value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the latest value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Emission count since construction. The seed value is version 0.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Store `value` and synchronously notify all live subscribers in
    /// registration order.
    ///
    /// No equality short-circuit: emitting a value equal to the current one
    /// still notifies every subscriber.
    pub fn emit(&self, value: T) {
        let (snapshot, subscribers) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            (inner.value.clone(), inner.subscribers.clone())
        };
        // Borrow released: callbacks may read the signal re-entrantly.
        for weak in subscribers {
            if let Some(callback) = weak.upgrade() {
                callback(&snapshot);
            }
        }
    }

    /// Register `callback` and immediately deliver the latest value to it.
    ///
    /// The returned [`Subscription`] must be kept alive for as long as the
    /// callback should keep receiving emissions.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        let current = self.inner.borrow().value.clone();
        callback(&current);
        Subscription {
            _keep_alive: Box::new(callback),
        }
    }

    /// Number of live subscribers. Prunes dead entries as a side effect.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|weak| weak.strong_count() > 0);
        inner.subscribers.len()
    }
}

/// RAII guard for a [`Signal`] subscription.
///
/// Dropping the guard unsubscribes the callback before the next
/// notification cycle.
#[must_use = "dropping a Subscription immediately unsubscribes its callback"]
pub struct Subscription {
    _keep_alive: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collector<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let sub = signal.subscribe(move |v: &T| seen_clone.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn subscribe_replays_latest_value() {
        let signal = Signal::new(5);
        let (seen, _sub) = collector(&signal);
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn emit_notifies_subscribers() {
        let signal = Signal::new(0);
        let (seen, _sub) = collector(&signal);
        signal.emit(1);
        signal.emit(2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn equal_emissions_are_not_deduplicated() {
        let signal = Signal::new(false);
        let (seen, _sub) = collector(&signal);
        signal.emit(false);
        signal.emit(false);
        assert_eq!(*seen.borrow(), vec![false, false, false]);
        assert_eq!(signal.version(), 2);
    }

    #[test]
    fn late_subscriber_sees_current_value_only() {
        let signal = Signal::new(1);
        signal.emit(2);
        signal.emit(3);
        let (seen, _sub) = collector(&signal);
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn drop_subscription_unsubscribes() {
        let signal = Signal::new(0);
        let (seen, sub) = collector(&signal);
        signal.emit(1);
        drop(sub);
        signal.emit(2);
        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_notified_in_registration_order() {
        let signal = Signal::new(0u32);
        let order = Rc::new(RefCell::new(Vec::new()));

        let order_a = Rc::clone(&order);
        let _sub_a = signal.subscribe(move |_| order_a.borrow_mut().push("a"));
        let order_b = Rc::clone(&order);
        let _sub_b = signal.subscribe(move |_| order_b.borrow_mut().push("b"));

        order.borrow_mut().clear(); // discard the replay deliveries
        signal.emit(1);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn callback_can_read_signal_reentrantly() {
        let signal = Signal::new(10);
        let observed = Rc::new(RefCell::new(Vec::new()));
        let observed_clone = Rc::clone(&observed);
        let signal_clone = signal.clone();
        let _sub = signal.subscribe(move |_| {
            observed_clone.borrow_mut().push(signal_clone.get());
        });
        signal.emit(20);
        assert_eq!(*observed.borrow(), vec![10, 20]);
    }

    #[test]
    fn clone_shares_stream() {
        let signal = Signal::new(0);
        let handle = signal.clone();
        let (seen, _sub) = collector(&handle);
        signal.emit(7);
        assert_eq!(*seen.borrow(), vec![0, 7]);
        assert_eq!(handle.get(), 7);
    }

    #[test]
    fn with_borrows_without_cloning() {
        let signal = Signal::new(vec![1, 2, 3]);
        let sum = signal.with(|v| v.iter().sum::<i32>());
        assert_eq!(sum, 6);
    }

    #[test]
    fn version_counts_emissions() {
        let signal = Signal::new(0);
        assert_eq!(signal.version(), 0);
        signal.emit(1);
        signal.emit(2);
        assert_eq!(signal.version(), 2);
    }
}
