//! # cashsim-device: The Simulated Cash-Changer Peripheral
//!
//! Builds a UnifiedPOS-style cash changer out of the pure engine in
//! cashsim-core: the deposit and dispense state machines, the fault model,
//! and the configuration that wires a device together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       cashsim-device                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ DepositController│   │DispenseController│   │  FaultInjector   │    │
//! │  │ begin/track/fix/ │   │ change/cash/     │   │ seedable rng,    │    │
//! │  │ pause/end        │   │ clear_error      │   │ delay window     │    │
//! │  └────────┬─────────┘   └────────┬─────────┘   └──────────────────┘    │
//! │           │    ┌────────────────┐│                                      │
//! │           └───►│CashChangerMgr  │◄─ ledger + log stay in lockstep      │
//! │                └───────┬────────┘                                       │
//! │                        ▼                                                │
//! │                  cashsim-core                                           │
//! │     Inventory • ChangeCalculator • Status • History • Hardware          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Surface
//! Every controller failure carries a UnifiedPOS-style code
//! ([`error::codes`]); the async dispense path additionally delivers it
//! through the completion callback. Nothing is retried internally.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod deposit;
pub mod device;
pub mod dispense;
pub mod error;
pub mod faults;
pub mod manager;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{DelayConfig, FaultConfig, SimulatorConfig, SlotConfig, ThresholdOverride};
pub use deposit::{
    DepositAction, DepositController, DepositSnapshot, DepositStatus, PauseRequest,
};
pub use device::CashChangerDevice;
pub use dispense::{CompletionCallback, DispenseController, DispenseMode, DispenseStatus};
pub use error::{codes, DeviceError, DeviceResult};
pub use faults::FaultInjector;
pub use manager::CashChangerManager;
