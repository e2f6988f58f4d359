//! # Change Calculator
//!
//! Turns a target amount into a per-denomination breakdown against current
//! stock. Stateless: it reads the inventory and never mutates it.
//!
//! ## The Greedy Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate(inventory, $6.35)                                            │
//! │                                                                         │
//! │  Slots in allocation order (value desc, Bill before Coin):             │
//! │                                                                         │
//! │   $5 bill  (stock 4) ──► take 1  ──► remaining $1.35                   │
//! │   $1 bill  (stock 2) ──► take 1  ──► remaining $0.35                   │
//! │   $1 coin  (stock 9) ──► take 0  ──► (remaining < value? no: $1>$0.35) │
//! │   25¢ coin (stock 3) ──► take 1  ──► remaining $0.10                   │
//! │   10¢ coin (stock 0) ──► skipped (no stock)                            │
//! │    5¢ coin (stock 2) ──► take 2  ──► remaining $0.00  ✓ done           │
//! │                                                                         │
//! │  remaining > 0 after the last slot ──► InsufficientStock               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitation (Intentional)
//! There is no backtracking. With stock {25¢ × 1, 10¢ × 3} and a target of
//! 30¢ the walk takes the quarter, strands a 5¢ remainder, and fails even
//! though 10¢ × 3 would have worked. Real changers accept this trade-off
//! for constant-time allocation; so does the simulation. Do not "improve"
//! this into optimal change-making.

use std::collections::BTreeMap;

use crate::denomination::DenominationKey;
use crate::error::{CoreError, CoreResult};
use crate::inventory::Inventory;
use crate::money::Money;

/// Stateless greedy change-making over a live inventory.
pub struct ChangeCalculator;

impl ChangeCalculator {
    /// Computes a breakdown whose value-weighted sum equals `target` exactly,
    /// or fails with [`CoreError::InsufficientStock`].
    ///
    /// ## Behavior
    /// - Slots are consumed in allocation order (largest value first, Bill
    ///   before Coin on ties).
    /// - Each slot contributes `min(available, remaining / value)` pieces.
    /// - The walk stops as soon as nothing remains; a non-positive `target`
    ///   therefore yields an empty breakdown.
    /// - `currency` restricts the walk to one currency code; `None` walks
    ///   every slot.
    /// - The inventory is never modified, including on failure.
    pub fn calculate(
        inventory: &Inventory,
        target: Money,
        currency: Option<&str>,
    ) -> CoreResult<BTreeMap<DenominationKey, i64>> {
        let stock = inventory.counts();
        let mut remaining = target.cents();
        let mut breakdown = BTreeMap::new();

        for (key, available) in &stock {
            if remaining <= 0 {
                break;
            }
            if *available <= 0 {
                continue;
            }
            if let Some(code) = currency {
                if key.currency != code {
                    continue;
                }
            }

            let value = key.value.cents();
            if value <= 0 {
                continue;
            }

            let take = (*available).min(remaining / value);
            if take > 0 {
                breakdown.insert(key.clone(), take);
                remaining -= take * value;
            }
        }

        if remaining > 0 {
            return Err(CoreError::InsufficientStock {
                requested: target.cents(),
                short: remaining,
            });
        }

        Ok(breakdown)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(cents: i64) -> DenominationKey {
        DenominationKey::bill(Money::from_cents(cents), "USD")
    }

    fn coin(cents: i64) -> DenominationKey {
        DenominationKey::coin(Money::from_cents(cents), "USD")
    }

    fn breakdown_total(breakdown: &BTreeMap<DenominationKey, i64>) -> i64 {
        breakdown
            .iter()
            .map(|(key, count)| key.value.cents() * count)
            .sum()
    }

    #[test]
    fn test_exact_change_largest_first() {
        let inv = Inventory::new();
        inv.set_count(&bill(500), 4);
        inv.set_count(&bill(100), 2);
        inv.set_count(&coin(25), 3);
        inv.set_count(&coin(5), 2);

        let breakdown = ChangeCalculator::calculate(&inv, Money::from_cents(635), None).unwrap();

        assert_eq!(breakdown_total(&breakdown), 635);
        assert_eq!(breakdown[&bill(500)], 1);
        assert_eq!(breakdown[&bill(100)], 1);
        assert_eq!(breakdown[&coin(25)], 1);
        assert_eq!(breakdown[&coin(5)], 2);
    }

    #[test]
    fn test_bill_preferred_over_coin_on_value_tie() {
        let inv = Inventory::new();
        inv.set_count(&bill(100), 1);
        inv.set_count(&coin(100), 1);

        let breakdown = ChangeCalculator::calculate(&inv, Money::from_cents(100), None).unwrap();

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[&bill(100)], 1);
    }

    #[test]
    fn test_insufficient_total_stock_fails() {
        let inv = Inventory::new();
        inv.set_count(&bill(100), 3);

        let err = ChangeCalculator::calculate(&inv, Money::from_cents(500), None).unwrap_err();

        match err {
            CoreError::InsufficientStock { requested, short } => {
                assert_eq!(requested, 500);
                assert_eq!(short, 200);
            }
        }
    }

    #[test]
    fn test_greedy_fails_without_backtracking() {
        // 25 + 10×3 could make 30 as 10×3, but greedy takes the quarter first
        let inv = Inventory::new();
        inv.set_count(&coin(25), 1);
        inv.set_count(&coin(10), 3);

        let result = ChangeCalculator::calculate(&inv, Money::from_cents(30), None);
        assert!(matches!(
            result,
            Err(CoreError::InsufficientStock { short: 5, .. })
        ));
    }

    #[test]
    fn test_failure_leaves_inventory_untouched() {
        let inv = Inventory::new();
        inv.set_count(&coin(25), 1);

        let _ = ChangeCalculator::calculate(&inv, Money::from_cents(1000), None);

        assert_eq!(inv.count(&coin(25)), 1);
        assert_eq!(inv.total(None).cents(), 25);
    }

    #[test]
    fn test_zero_target_yields_empty_breakdown() {
        let inv = Inventory::new();
        inv.set_count(&bill(100), 5);

        let breakdown = ChangeCalculator::calculate(&inv, Money::zero(), None).unwrap();
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_empty_slots_are_skipped() {
        let inv = Inventory::new();
        inv.set_count(&bill(500), 0);
        inv.set_count(&bill(100), 5);

        let breakdown = ChangeCalculator::calculate(&inv, Money::from_cents(300), None).unwrap();
        assert_eq!(breakdown[&bill(100)], 3);
        assert!(!breakdown.contains_key(&bill(500)));
    }

    #[test]
    fn test_currency_filter_restricts_walk() {
        let inv = Inventory::new();
        inv.set_count(&DenominationKey::bill(Money::from_cents(500), "EUR"), 10);
        inv.set_count(&bill(100), 10);

        let breakdown =
            ChangeCalculator::calculate(&inv, Money::from_cents(500), Some("USD")).unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[&bill(100)], 5);
    }
}
