//! # Device Error Types
//!
//! Failures surfaced by the deposit and dispense state machines, each
//! carrying the UnifiedPOS-style numeric code a real changer driver would
//! report.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Condition                      Variant           code   extended       │
//! │  ─────────────────────────────  ───────────────   ────   ────────       │
//! │  call outside legal transition  IllegalSequence   106    0              │
//! │  dispense already in flight     Busy              113    0              │
//! │  mechanical jam                 Jammed            111    0              │
//! │  unresolved validator overlap   Overlapped        111    0              │
//! │  simulated/unexpected fault     Failure           111    0              │
//! │  calculator cannot make change  OverDispense      114    201            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core never retries: every variant goes straight to the immediate
//! caller (and, on the async dispense path, to the completion callback).

use cashsim_core::CoreError;
use thiserror::Error;

// =============================================================================
// Numeric Codes
// =============================================================================

/// UnifiedPOS result and extended codes reproduced by the simulation.
///
/// Host software written against a real changer driver can map these 1:1.
pub mod codes {
    /// Operation completed.
    pub const SUCCESS: i32 = 0;
    /// Call made outside its legal state-machine transition.
    pub const E_ILLEGAL: i32 = 106;
    /// Device failure (jam, overlap, simulated fault).
    pub const E_FAILURE: i32 = 111;
    /// An operation is already in flight.
    pub const E_BUSY: i32 = 113;
    /// Extended error; see the extended code.
    pub const E_EXTENDED: i32 = 114;
    /// Extended code: requested payout exceeds dispensable stock.
    pub const ECHAN_OVERDISPENSE: i32 = 201;
}

// =============================================================================
// Device Error
// =============================================================================

/// Failures raised by the controllers.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A call was made outside its legal state-machine transition
    /// (e.g. `fix_deposit` before `begin_deposit`, double pause).
    #[error("illegal sequence in {operation}: {reason}")]
    IllegalSequence {
        operation: &'static str,
        reason: &'static str,
    },

    /// A dispense is already in flight on this controller.
    #[error("device busy: a dispense is already in flight")]
    Busy,

    /// The simulated mechanical jam flag is set; no dispense can run.
    #[error("device failure: mechanical jam")]
    Jammed,

    /// The validator-overlap flag is set; the deposit session cannot
    /// complete until the cash is repaid.
    #[error("device failure: validator overlap unresolved")]
    Overlapped,

    /// Simulated random fault or any otherwise-unexpected failure.
    #[error("device failure: {reason}")]
    Failure { reason: String },

    /// The change calculator could not satisfy the requested amount.
    #[error("over-dispense: {0}")]
    OverDispense(#[from] CoreError),
}

impl DeviceError {
    /// The UnifiedPOS result code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            DeviceError::IllegalSequence { .. } => codes::E_ILLEGAL,
            DeviceError::Busy => codes::E_BUSY,
            DeviceError::Jammed | DeviceError::Overlapped | DeviceError::Failure { .. } => {
                codes::E_FAILURE
            }
            DeviceError::OverDispense(_) => codes::E_EXTENDED,
        }
    }

    /// The UnifiedPOS extended code; 0 for everything but over-dispense.
    pub fn extended_code(&self) -> i32 {
        match self {
            DeviceError::OverDispense(_) => codes::ECHAN_OVERDISPENSE,
            _ => 0,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with DeviceError.
pub type DeviceResult<T> = Result<T, DeviceError>;

// =============================================================================
// Unit Tests
// =============================================================================
