//! # Signal Module
//!
//! Synchronous multicast notification, the push primitive behind every
//! "changed" event in the simulator (inventory, history, status monitors,
//! hardware faults, controllers).
//!
//! ## Why Not a Channel?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Delivery Contract                                                      │
//! │                                                                         │
//! │  inventory.add(key, 1)                                                  │
//! │       │                                                                 │
//! │       ├──► subscriber 1 runs        BEFORE add() returns                │
//! │       ├──► subscriber 2 runs        in subscription order               │
//! │       └──► subscriber 3 runs        no batching, no reordering          │
//! │                                                                         │
//! │  A broadcast channel delivers on the receiver's task — after the       │
//! │  mutating call returned. Status recomputation must be visible the      │
//! │  instant the mutation completes, so delivery is a plain call chain.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! Subscribers are stored as `Arc<dyn Fn>` behind a `Mutex`. `emit` clones
//! the list and releases the lock before invoking, so a subscriber may
//! subscribe to the same signal without deadlocking.

use std::sync::{Arc, Mutex};

/// A subscriber callback. Shared ownership so `emit` can run outside the lock.
type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Synchronous multicast signal.
///
/// ## Invariants
/// - Subscribers are invoked in subscription order.
/// - Every `emit` reaches every subscriber; there is no de-duplication.
/// - Delivery completes before `emit` returns.
pub struct Signal<T> {
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Signal {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback invoked on every subsequent `emit`.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        let mut subs = self.subscribers.lock().expect("signal mutex poisoned");
        subs.push(Arc::new(callback));
    }

    /// Delivers `value` to every subscriber, in order, synchronously.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Subscriber<T>> = {
            let subs = self.subscribers.lock().expect("signal mutex poisoned");
            subs.clone()
        };
        for subscriber in snapshot {
            subscriber(value);
        }
    }

    /// Number of registered subscribers (diagnostics).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("signal mutex poisoned")
            .len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Signal::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
