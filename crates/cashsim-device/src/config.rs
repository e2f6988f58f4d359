//! # Simulator Configuration
//!
//! Everything the device is constructed from: the initial float, slot
//! thresholds, the simulated delay window, and the two fault rates.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables — a handful of runtime knobs only (currency,
//!    delay enable, the two fault rates; see [`SimulatorConfig::from_env`])
//! 2. Host-supplied `SimulatorConfig` (e.g. deserialized from JSON) for
//!    everything else: the float, thresholds, delay bounds
//! 3. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after device construction, so no mutex needed.

use serde::{Deserialize, Serialize};

use cashsim_core::{CashKind, DenominationKey, Money, Thresholds, DEFAULT_CURRENCY, DEFAULT_THRESHOLDS};

// =============================================================================
// Sub-Configs
// =============================================================================

/// One denomination slot in the initial float.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    /// Face value in cents.
    pub value_cents: i64,

    /// Bill or coin.
    pub kind: CashKind,

    /// Pieces loaded at construction.
    pub count: i64,
}

impl SlotConfig {
    /// Creates a slot entry.
    pub const fn new(value_cents: i64, kind: CashKind, count: i64) -> Self {
        SlotConfig {
            value_cents,
            kind,
            count,
        }
    }
}

/// Per-slot threshold override; slots without one use the global default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverride {
    /// Face value in cents of the slot this override applies to.
    pub value_cents: i64,

    /// Bill or coin.
    pub kind: CashKind,

    /// Replacement thresholds.
    pub thresholds: Thresholds,
}

/// Simulated mechanical delay applied at the start of each dispense body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayConfig {
    /// When false the dispense body runs with no delay at all.
    pub enabled: bool,

    /// Lower bound, milliseconds.
    pub min_ms: u64,

    /// Upper bound, milliseconds (inclusive).
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        DelayConfig {
            enabled: false,
            min_ms: 200,
            max_ms: 800,
        }
    }
}

/// One random-fault knob (there are two: dispense path, deposit path).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultConfig {
    /// When false the injector never fires for this path.
    pub enabled: bool,

    /// Failure probability per roll, 0.0 to 1.0.
    pub rate: f64,
}

impl FaultConfig {
    /// A knob that never fires.
    pub const fn disabled() -> Self {
        FaultConfig {
            enabled: false,
            rate: 0.0,
        }
    }

    /// A knob that always fires (test helper).
    pub const fn certain() -> Self {
        FaultConfig {
            enabled: true,
            rate: 1.0,
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        FaultConfig::disabled()
    }
}

// =============================================================================
// Simulator Config
// =============================================================================

/// Full device construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Default currency code (ISO 4217) for slots and dispense-by-amount.
    pub currency_code: String,

    /// Initial per-denomination float.
    pub initial_counts: Vec<SlotConfig>,

    /// Global slot thresholds (nearEmpty / nearFull / full).
    pub thresholds: Thresholds,

    /// Per-slot threshold overrides.
    pub threshold_overrides: Vec<ThresholdOverride>,

    /// Simulated mechanical delay on the dispense path.
    pub delay: DelayConfig,

    /// Random-failure knob for the dispense path.
    pub dispense_fault: FaultConfig,

    /// Random validation-failure knob for the deposit path.
    pub deposit_fault: FaultConfig,
}

impl Default for SimulatorConfig {
    /// Returns a development float: a till drawer's worth of USD.
    ///
    /// ## Default Values
    /// - Bills: 20 × $20, 30 × $10, 40 × $5, 50 × $1
    /// - Coins: 60 each of 25¢/10¢/5¢/1¢
    /// - Thresholds: 10 / 80 / 100 globally
    /// - Delay and both fault knobs: disabled (deterministic by default)
    fn default() -> Self {
        SimulatorConfig {
            currency_code: DEFAULT_CURRENCY.to_string(),
            initial_counts: vec![
                SlotConfig::new(2000, CashKind::Bill, 20),
                SlotConfig::new(1000, CashKind::Bill, 30),
                SlotConfig::new(500, CashKind::Bill, 40),
                SlotConfig::new(100, CashKind::Bill, 50),
                SlotConfig::new(25, CashKind::Coin, 60),
                SlotConfig::new(10, CashKind::Coin, 60),
                SlotConfig::new(5, CashKind::Coin, 60),
                SlotConfig::new(1, CashKind::Coin, 60),
            ],
            thresholds: DEFAULT_THRESHOLDS,
            threshold_overrides: Vec::new(),
            delay: DelayConfig::default(),
            dispense_fault: FaultConfig::disabled(),
            deposit_fault: FaultConfig::disabled(),
        }
    }
}

impl SimulatorConfig {
    /// Creates a SimulatorConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `CASHSIM_CURRENCY`: Override currency code
    /// - `CASHSIM_DELAY_ENABLED`: "1"/"true" enables the dispense delay
    /// - `CASHSIM_DISPENSE_FAULT_RATE`: enables the dispense fault knob at
    ///   the given rate (e.g. "0.05")
    /// - `CASHSIM_DEPOSIT_FAULT_RATE`: likewise for deposit validation
    pub fn from_env() -> Self {
        let mut config = SimulatorConfig::default();

        if let Ok(currency) = std::env::var("CASHSIM_CURRENCY") {
            config.currency_code = currency;
        }

        if let Ok(enabled) = std::env::var("CASHSIM_DELAY_ENABLED") {
            config.delay.enabled = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }

        if let Ok(rate_str) = std::env::var("CASHSIM_DISPENSE_FAULT_RATE") {
            if let Ok(rate) = rate_str.parse::<f64>() {
                config.dispense_fault = FaultConfig {
                    enabled: rate > 0.0,
                    rate,
                };
            }
        }

        if let Ok(rate_str) = std::env::var("CASHSIM_DEPOSIT_FAULT_RATE") {
            if let Ok(rate) = rate_str.parse::<f64>() {
                config.deposit_fault = FaultConfig {
                    enabled: rate > 0.0,
                    rate,
                };
            }
        }

        config
    }

    /// The denomination key a slot entry describes, in this config's currency.
    pub fn slot_key(&self, slot: &SlotConfig) -> DenominationKey {
        DenominationKey {
            value: Money::from_cents(slot.value_cents),
            kind: slot.kind,
            currency: self.currency_code.clone(),
        }
    }

    /// Thresholds for a slot: the override if one matches, else the global.
    pub fn thresholds_for(&self, key: &DenominationKey) -> Thresholds {
        self.threshold_overrides
            .iter()
            .find(|o| o.value_cents == key.value.cents() && o.kind == key.kind)
            .map(|o| o.thresholds)
            .unwrap_or(self.thresholds)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
