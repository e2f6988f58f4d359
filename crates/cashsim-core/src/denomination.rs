//! # Denomination Types
//!
//! A cash changer holds its stock in *slots*, one per denomination. The
//! [`DenominationKey`] is the unique identifier of a slot: the face value,
//! whether it is a bill or a coin, and the currency it belongs to.
//!
//! ## Allocation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The key's Ord IS the greedy allocation order                           │
//! │                                                                         │
//! │  $20 bill < means "allocated before" < $10 bill < $1 bill < $1 coin    │
//! │                                                                         │
//! │  1. Descending by face value                                            │
//! │  2. On a value tie, Bill before Coin                                    │
//! │  3. Then currency code (stable iteration across currencies)             │
//! │                                                                         │
//! │  A BTreeMap<DenominationKey, _> therefore iterates largest-first,      │
//! │  which is exactly the order the change calculator consumes.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::money::Money;

// =============================================================================
// Cash Kind
// =============================================================================

/// Whether a denomination is paper or metal.
///
/// Declaration order matters: `Bill` derives as less than `Coin`, which is
/// the tie-break the allocation order requires.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CashKind {
    /// Paper currency (dispensed from the bill transport).
    Bill,

    /// Metal currency (dispensed from the coin hopper).
    Coin,
}

impl fmt::Display for CashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashKind::Bill => write!(f, "bill"),
            CashKind::Coin => write!(f, "coin"),
        }
    }
}

impl FromStr for CashKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bill" => Ok(CashKind::Bill),
            "coin" => Ok(CashKind::Coin),
            other => Err(format!("unknown cash kind: {other}")),
        }
    }
}

// =============================================================================
// Denomination Key
// =============================================================================

/// Immutable identity of one denomination slot.
///
/// ## Invariants
/// - Equality is by all three fields; two $1 slots of different kind are
///   distinct slots.
/// - `Ord` is the allocation order (value descending, Bill before Coin,
///   then currency code), NOT plain ascending value. Collections keyed by
///   this type iterate in the order the greedy calculator wants.
///
/// Serializes as the compact token `"USD:bill:2000"` so maps keyed by a
/// denomination survive the trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DenominationKey {
    /// Face value of one piece.
    pub value: Money,

    /// Bill or coin.
    pub kind: CashKind,

    /// ISO 4217 currency code, e.g. "USD".
    pub currency: String,
}

impl DenominationKey {
    /// Creates a bill denomination.
    pub fn bill(value: Money, currency: impl Into<String>) -> Self {
        DenominationKey {
            value,
            kind: CashKind::Bill,
            currency: currency.into(),
        }
    }

    /// Creates a coin denomination.
    pub fn coin(value: Money, currency: impl Into<String>) -> Self {
        DenominationKey {
            value,
            kind: CashKind::Coin,
            currency: currency.into(),
        }
    }
}

impl PartialOrd for DenominationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DenominationKey {
    /// Allocation order: descending value, Bill before Coin, then currency.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .cmp(&self.value)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.currency.cmp(&other.currency))
    }
}

impl fmt::Display for DenominationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.currency, self.value, self.kind)
    }
}

impl FromStr for DenominationKey {
    type Err = String;

    /// Parses the serialized token form, `"USD:bill:2000"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let currency = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("malformed denomination token: {s}"))?;
        let kind: CashKind = parts
            .next()
            .ok_or_else(|| format!("malformed denomination token: {s}"))?
            .parse()?;
        let cents: i64 = parts
            .next()
            .ok_or_else(|| format!("malformed denomination token: {s}"))?
            .parse()
            .map_err(|_| format!("malformed denomination value in: {s}"))?;

        Ok(DenominationKey {
            value: Money::from_cents(cents),
            kind,
            currency: currency.to_string(),
        })
    }
}

impl Serialize for DenominationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!(
            "{}:{}:{}",
            self.currency,
            self.kind,
            self.value.cents()
        ))
    }
}

impl<'de> Deserialize<'de> for DenominationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(DeError::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_bill(cents: i64) -> DenominationKey {
        DenominationKey::bill(Money::from_cents(cents), "USD")
    }

    fn usd_coin(cents: i64) -> DenominationKey {
        DenominationKey::coin(Money::from_cents(cents), "USD")
    }

    #[test]
    fn test_allocation_order_descends_by_value() {
        let mut keys = vec![usd_bill(100), usd_bill(2000), usd_bill(500)];
        keys.sort();

        let values: Vec<i64> = keys.iter().map(|k| k.value.cents()).collect();
        assert_eq!(values, vec![2000, 500, 100]);
    }

    #[test]
    fn test_bill_sorts_before_coin_on_value_tie() {
        let mut keys = vec![usd_coin(100), usd_bill(100)];
        keys.sort();

        assert_eq!(keys[0].kind, CashKind::Bill);
        assert_eq!(keys[1].kind, CashKind::Coin);
    }

    #[test]
    fn test_equality_is_by_all_fields() {
        assert_eq!(usd_bill(100), usd_bill(100));
        assert_ne!(usd_bill(100), usd_coin(100));
        assert_ne!(
            usd_bill(100),
            DenominationKey::bill(Money::from_cents(100), "EUR")
        );
    }

    #[test]
    fn test_btreemap_iterates_in_allocation_order() {
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(usd_coin(25), 10);
        map.insert(usd_bill(2000), 5);
        map.insert(usd_bill(100), 50);
        map.insert(usd_coin(100), 30);

        let order: Vec<(i64, CashKind)> = map
            .keys()
            .map(|k| (k.value.cents(), k.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                (2000, CashKind::Bill),
                (100, CashKind::Bill),
                (100, CashKind::Coin),
                (25, CashKind::Coin),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", usd_bill(2000)), "USD $20.00 bill");
        assert_eq!(format!("{}", usd_coin(25)), "USD $0.25 coin");
    }

    #[test]
    fn test_serde_token_form() {
        let json = serde_json::to_string(&usd_bill(2000)).unwrap();
        assert_eq!(json, "\"USD:bill:2000\"");

        let key: DenominationKey = serde_json::from_str("\"USD:coin:25\"").unwrap();
        assert_eq!(key, usd_coin(25));

        assert!("USD:wad:100".parse::<DenominationKey>().is_err());
        assert!("USD:bill".parse::<DenominationKey>().is_err());
    }

    #[test]
    fn test_keyed_map_survives_json() {
        use std::collections::BTreeMap;

        let mut counts = BTreeMap::new();
        counts.insert(usd_bill(500), 4_i64);
        counts.insert(usd_coin(25), 9_i64);

        let json = serde_json::to_string(&counts).unwrap();
        let back: BTreeMap<DenominationKey, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counts);
    }
}
