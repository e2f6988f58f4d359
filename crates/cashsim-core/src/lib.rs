//! # cashsim-core: Pure Simulation Logic for CashSim
//!
//! This crate is the **heart** of CashSim. It contains the cash-changer
//! simulation engine as pure in-memory logic with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CashSim Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Host software (POS app, test harness)                │   │
//! │  │     BeginDeposit ──► TrackDeposit ──► FixDeposit ──► EndDeposit │   │
//! │  │     DispenseChange / DispenseCash / ClearError                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              cashsim-device (controllers, faults)               │   │
//! │  │     DepositController • DispenseController • FaultInjector      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cashsim-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐     │   │
//! │  │   │ inventory │ │  change   │ │  status   │ │  history  │     │   │
//! │  │   │  ledger   │ │  greedy   │ │ monitors  │ │ append-   │     │   │
//! │  │   │ + signal  │ │   calc    │ │ + 2 axes  │ │ only log  │     │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO RANDOMNESS • DETERMINISTIC           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer minor-unit money (no floating point!)
//! - [`denomination`] - Slot identity with allocation-order `Ord`
//! - [`signal`] - Synchronous multicast notification primitive
//! - [`inventory`] - Per-denomination ledger, the source of truth for stock
//! - [`change`] - Greedy change calculator (deliberately not optimal)
//! - [`status`] - Threshold classifier and two-axis device aggregation
//! - [`history`] - Append-only transaction log
//! - [`hardware`] - Simulated jam / validator-overlap fault flags
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: randomness and delay live in cashsim-device
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Synchronous push**: every mutation notifies before it returns

// =============================================================================
// Module Declarations
// =============================================================================

pub mod change;
pub mod denomination;
pub mod error;
pub mod hardware;
pub mod history;
pub mod inventory;
pub mod money;
pub mod signal;
pub mod status;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cashsim_core::Money` instead of
// `use cashsim_core::money::Money`

pub use change::ChangeCalculator;
pub use denomination::{CashKind, DenominationKey};
pub use error::{CoreError, CoreResult};
pub use hardware::HardwareStatusManager;
pub use history::{TransactionEntry, TransactionHistory, TransactionType};
pub use inventory::Inventory;
pub use money::Money;
pub use signal::Signal;
pub use status::{CashStatus, CashStatusMonitor, OverallStatusAggregator, Thresholds};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default currency code when a host does not configure one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Default slot thresholds (nearEmpty / nearFull / full).
///
/// ## Why These Values
/// A typical changer cassette holds on the order of 100 pieces; warning at
/// 10 remaining and 80 stacked matches the register-float guidance the
/// simulated device ships with. Hosts override per slot via configuration.
pub const DEFAULT_THRESHOLDS: Thresholds = Thresholds::new(10, 80, 100);
