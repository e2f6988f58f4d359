//! # Inventory Module
//!
//! The per-denomination ledger: the sole source of truth for what the
//! simulated machine physically holds.
//!
//! ## Inventory Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inventory Operations                                 │
//! │                                                                         │
//! │  Caller Action            Ledger Change            Notification        │
//! │  ─────────────            ─────────────            ────────────        │
//! │                                                                         │
//! │  add(key, +3) ──────────► counts[key] += 3 ──────► changed.emit(key)   │
//! │                                                                         │
//! │  set_count(key, 50) ────► counts[key] = 50 ──────► changed.emit(key)   │
//! │                                                                         │
//! │  count(key) ────────────► (read only, 0 if absent)                     │
//! │                                                                         │
//! │  total(filter) ─────────► Σ(count × value)                             │
//! │                                                                         │
//! │  NOTE: the change signal fires synchronously, before the mutating      │
//! │        call returns, so status monitors are never stale afterwards.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The count map sits behind its own mutex so the signal can deliver outside
//! the lock (subscribers read counts back without deadlocking). This is
//! per-operation safety only: the simulator models one physical device with
//! one operator, and callers serialize multi-step sequences themselves.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::denomination::DenominationKey;
use crate::money::Money;
use crate::signal::Signal;

/// Ledger of per-denomination piece counts.
///
/// ## Invariants
/// - `total(None)` always equals Σ(count × value) over all slots.
/// - A slot absent from the map counts as zero.
/// - Counts are NOT clamped: `add` may drive a count negative. Whether a
///   deficit is a legal domain state is deliberately left open; the ledger
///   records what it is told and the status monitor classifies the result.
#[derive(Debug)]
pub struct Inventory {
    counts: Mutex<BTreeMap<DenominationKey, i64>>,
    changed: Signal<DenominationKey>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Inventory {
            counts: Mutex::new(BTreeMap::new()),
            changed: Signal::new(),
        }
    }

    /// Applies `delta` to the slot's count, creating the slot at 0 first if
    /// absent. Emits the change signal for `key`.
    ///
    /// No clamping: a negative result is stored as-is.
    pub fn add(&self, key: &DenominationKey, delta: i64) {
        {
            let mut counts = self.counts.lock().expect("inventory mutex poisoned");
            *counts.entry(key.clone()).or_insert(0) += delta;
        }
        self.changed.emit(key);
    }

    /// Overwrites the slot's count. Emits the change signal for `key`.
    pub fn set_count(&self, key: &DenominationKey, count: i64) {
        {
            let mut counts = self.counts.lock().expect("inventory mutex poisoned");
            counts.insert(key.clone(), count);
        }
        self.changed.emit(key);
    }

    /// Returns the slot's count, 0 if the slot was never touched. Read-only.
    pub fn count(&self, key: &DenominationKey) -> i64 {
        let counts = self.counts.lock().expect("inventory mutex poisoned");
        counts.get(key).copied().unwrap_or(0)
    }

    /// Sums `count × value` over all slots, optionally restricted to one
    /// currency code.
    pub fn total(&self, currency: Option<&str>) -> Money {
        let counts = self.counts.lock().expect("inventory mutex poisoned");
        counts
            .iter()
            .filter(|(key, _)| currency.map_or(true, |c| key.currency == c))
            .fold(Money::zero(), |acc, (key, count)| {
                acc + key.value.multiply_quantity(*count)
            })
    }

    /// Snapshot of every slot and its count, in allocation order.
    pub fn counts(&self) -> BTreeMap<DenominationKey, i64> {
        self.counts
            .lock()
            .expect("inventory mutex poisoned")
            .clone()
    }

    /// The change signal. Emits the affected key on every `add`/`set_count`.
    pub fn changed(&self) -> &Signal<DenominationKey> {
        &self.changed
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Inventory::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bill(cents: i64) -> DenominationKey {
        DenominationKey::bill(Money::from_cents(cents), "USD")
    }

    fn coin(cents: i64) -> DenominationKey {
        DenominationKey::coin(Money::from_cents(cents), "USD")
    }

    #[test]
    fn test_add_creates_slot_at_zero() {
        let inv = Inventory::new();
        let key = bill(500);

        assert_eq!(inv.count(&key), 0);
        inv.add(&key, 3);
        assert_eq!(inv.count(&key), 3);
    }

    #[test]
    fn test_set_count_overwrites() {
        let inv = Inventory::new();
        let key = coin(25);

        inv.add(&key, 7);
        inv.set_count(&key, 40);
        assert_eq!(inv.count(&key), 40);
    }

    #[test]
    fn test_total_sums_value_times_count() {
        let inv = Inventory::new();
        inv.set_count(&bill(2000), 2); // $40.00
        inv.set_count(&bill(100), 5); // $5.00
        inv.set_count(&coin(25), 8); // $2.00

        assert_eq!(inv.total(None).cents(), 4700);
    }

    #[test]
    fn test_total_with_currency_filter() {
        let inv = Inventory::new();
        inv.set_count(&bill(1000), 1);
        inv.set_count(&DenominationKey::bill(Money::from_cents(500), "EUR"), 2);

        assert_eq!(inv.total(Some("USD")).cents(), 1000);
        assert_eq!(inv.total(Some("EUR")).cents(), 1000);
        assert_eq!(inv.total(None).cents(), 2000);
    }

    #[test]
    fn test_negative_counts_are_not_clamped() {
        let inv = Inventory::new();
        let key = coin(25);

        inv.add(&key, -4);
        assert_eq!(inv.count(&key), -4);
        assert_eq!(inv.total(None).cents(), -100);
    }

    #[test]
    fn test_change_signal_fires_per_mutation() {
        let inv = Inventory::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        inv.changed().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let key = bill(100);
        inv.add(&key, 1);
        inv.set_count(&key, 9);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscriber_sees_fresh_count() {
        let inv = Arc::new(Inventory::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::clone(&inv);
        let log = Arc::clone(&seen);
        inv.changed().subscribe(move |key| {
            log.lock().unwrap().push(reader.count(key));
        });

        let key = coin(10);
        inv.add(&key, 2);
        inv.add(&key, 3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 5]);
    }

    #[test]
    fn test_count_is_side_effect_free() {
        let inv = Inventory::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        inv.changed().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _ = inv.count(&bill(100));
        let _ = inv.total(None);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
