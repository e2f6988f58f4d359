//! # Cash Changer Manager
//!
//! Orchestrates the inventory and the transaction history for whole money
//! movements: every deposit, dispense, refill, and collection goes through
//! here so the ledger and the log never drift apart.
//!
//! ## Movement Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deposit(counts)          inventory.add(+)    history: Deposit, +amount │
//! │  dispense_counts(counts)  inventory.add(−)    history: Dispense, −amount│
//! │  dispense_amount(amount)  ChangeCalculator ──► dispense_counts(...)     │
//! │  refill(counts)           inventory.add(+)    history: Refill, +amount  │
//! │  collect(counts)          inventory.add(−)    history: Collection, −amt │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use cashsim_core::{
    ChangeCalculator, CoreResult, DenominationKey, Inventory, Money, TransactionEntry,
    TransactionHistory, TransactionType,
};

/// Sums `value × count` over a breakdown.
fn breakdown_amount(counts: &BTreeMap<DenominationKey, i64>) -> Money {
    counts.iter().fold(Money::zero(), |acc, (key, count)| {
        acc + key.value.multiply_quantity(*count)
    })
}

/// Shared orchestrator over the inventory ledger and the transaction log.
#[derive(Debug, Clone)]
pub struct CashChangerManager {
    inventory: Arc<Inventory>,
    history: Arc<TransactionHistory>,
}

impl CashChangerManager {
    /// Wraps the shared ledger and log.
    pub fn new(inventory: Arc<Inventory>, history: Arc<TransactionHistory>) -> Self {
        CashChangerManager { inventory, history }
    }

    /// The shared inventory.
    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// The shared transaction log.
    pub fn history(&self) -> &Arc<TransactionHistory> {
        &self.history
    }

    /// Adds each count to the inventory and logs one Deposit entry with the
    /// summed amount and the breakdown.
    pub fn deposit(&self, counts: &BTreeMap<DenominationKey, i64>) -> Money {
        let amount = self.apply(counts, 1, TransactionType::Deposit);
        info!(amount = %amount, "deposit committed");
        amount
    }

    /// Subtracts each count from the inventory and logs one Dispense entry
    /// (negative amount, negative counts).
    pub fn dispense_counts(&self, counts: &BTreeMap<DenominationKey, i64>) -> Money {
        let amount = self.apply(counts, -1, TransactionType::Dispense);
        info!(amount = %amount, "dispense committed");
        amount
    }

    /// Computes a breakdown for `amount` against current stock, then pays it
    /// out. The calculator's insufficient-stock failure propagates unchanged
    /// and leaves the inventory untouched.
    pub fn dispense_amount(
        &self,
        amount: Money,
        currency: Option<&str>,
    ) -> CoreResult<BTreeMap<DenominationKey, i64>> {
        let breakdown = ChangeCalculator::calculate(&self.inventory, amount, currency)?;
        debug!(amount = %amount, slots = breakdown.len(), "change computed");
        self.dispense_counts(&breakdown);
        Ok(breakdown)
    }

    /// Operator top-up: adds counts and logs a Refill entry.
    pub fn refill(&self, counts: &BTreeMap<DenominationKey, i64>) -> Money {
        let amount = self.apply(counts, 1, TransactionType::Refill);
        info!(amount = %amount, "refill committed");
        amount
    }

    /// Operator pull: subtracts counts and logs a Collection entry.
    pub fn collect(&self, counts: &BTreeMap<DenominationKey, i64>) -> Money {
        let amount = self.apply(counts, -1, TransactionType::Collection);
        info!(amount = %amount, "collection committed");
        amount
    }

    /// Applies `counts × sign` to the inventory and appends one entry whose
    /// amount and counts carry the same sign. Returns the signed amount.
    fn apply(
        &self,
        counts: &BTreeMap<DenominationKey, i64>,
        sign: i64,
        entry_type: TransactionType,
    ) -> Money {
        let mut signed = BTreeMap::new();
        for (key, count) in counts {
            let delta = count * sign;
            self.inventory.add(key, delta);
            signed.insert(key.clone(), delta);
        }
        let amount = breakdown_amount(&signed);
        self.history
            .add(TransactionEntry::new(entry_type, amount, signed));
        amount
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
