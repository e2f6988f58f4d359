//! # Transaction History
//!
//! Append-only log of completed money movements. Every deposit, dispense,
//! refill, collection, and adjustment lands here with a timestamp, a signed
//! amount, and the per-denomination breakdown that produced it.
//!
//! Retention is a host concern: the core never removes or mutates an entry.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::denomination::DenominationKey;
use crate::money::Money;
use crate::signal::Signal;

// =============================================================================
// Transaction Types
// =============================================================================

/// What kind of movement an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    /// Cash accepted from a customer.
    Deposit,
    /// Cash paid out to a customer.
    Dispense,
    /// Operator topped up the float.
    Refill,
    /// Operator removed cash from the machine.
    Collection,
    /// Manual count correction.
    Adjustment,
}

// =============================================================================
// Transaction Entry
// =============================================================================

/// One completed money movement.
///
/// ## Dual-Key Identity
/// - `id`: UUID v4, immutable, for host-side correlation
/// - the business payload: timestamp + type + amount + breakdown
///
/// `amount` and every count in `counts` are signed deltas: a dispense is
/// recorded negative, a deposit positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// When the movement completed.
    pub timestamp: DateTime<Utc>,

    /// Movement kind.
    pub entry_type: TransactionType,

    /// Signed currency delta for the whole movement.
    pub amount: Money,

    /// Signed per-denomination piece deltas.
    pub counts: BTreeMap<DenominationKey, i64>,
}

impl TransactionEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        entry_type: TransactionType,
        amount: Money,
        counts: BTreeMap<DenominationKey, i64>,
    ) -> Self {
        TransactionEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            entry_type,
            amount,
            counts,
        }
    }
}

// =============================================================================
// Transaction History
// =============================================================================

/// Ordered, append-only sequence of entries.
///
/// ## Invariants
/// - Insertion order is chronological order.
/// - Entries are never removed or mutated.
/// - The added signal fires synchronously inside `add`.
#[derive(Debug)]
pub struct TransactionHistory {
    entries: Mutex<Vec<TransactionEntry>>,
    added: Signal<TransactionEntry>,
}

impl TransactionHistory {
    /// Creates an empty log.
    pub fn new() -> Self {
        TransactionHistory {
            entries: Mutex::new(Vec::new()),
            added: Signal::new(),
        }
    }

    /// Appends an entry and emits it.
    pub fn add(&self, entry: TransactionEntry) {
        {
            let mut entries = self.entries.lock().expect("history mutex poisoned");
            entries.push(entry.clone());
        }
        self.added.emit(&entry);
    }

    /// Snapshot of the full log, oldest first.
    pub fn entries(&self) -> Vec<TransactionEntry> {
        self.entries
            .lock()
            .expect("history mutex poisoned")
            .clone()
    }

    /// Number of recorded movements.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("history mutex poisoned").len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The added signal; emits each appended entry.
    pub fn added(&self) -> &Signal<TransactionEntry> {
        &self.added
    }
}

impl Default for TransactionHistory {
    fn default() -> Self {
        TransactionHistory::new()
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

    fn entry(entry_type: TransactionType, cents: i64) -> TransactionEntry {
        let mut counts = BTreeMap::new();
        counts.insert(
            DenominationKey::bill(Money::from_cents(cents.abs()), "USD"),
            if cents < 0 { -1 } else { 1 },
        );
        TransactionEntry::new(entry_type, Money::from_cents(cents), counts)
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let history = TransactionHistory::new();
        history.add(entry(TransactionType::Deposit, 1000));
        history.add(entry(TransactionType::Dispense, -500));
        history.add(entry(TransactionType::Refill, 2000));

        let types: Vec<TransactionType> =
            history.entries().iter().map(|e| e.entry_type).collect();
        assert_eq!(
            types,
            vec![
                TransactionType::Deposit,
                TransactionType::Dispense,
                TransactionType::Refill,
            ]
        );
    }

    #[test]
    fn test_added_signal_fires_synchronously() {
        let history = TransactionHistory::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        history.added().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        history.add(entry(TransactionType::Deposit, 1000));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_entries_snapshot_does_not_alias_log() {
        let history = TransactionHistory::new();
        history.add(entry(TransactionType::Deposit, 1000));

        let mut snapshot = history.entries();
        snapshot.clear();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let a = entry(TransactionType::Deposit, 100);
        let b = entry(TransactionType::Deposit, 100);
        assert_ne!(a.id, b.id);
    }
}
