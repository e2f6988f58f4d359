//! # Error Types
//!
//! Domain-specific error types for cashsim-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cashsim-core errors (this file)                                       │
//! │  └── CoreError        - Change-making failures                         │
//! │                                                                         │
//! │  cashsim-device errors (separate crate)                                │
//! │  └── DeviceError      - State machine / fault model failures,          │
//! │                         carries UnifiedPOS-style numeric codes         │
//! │                                                                         │
//! │  Flow: CoreError ──#[from]──► DeviceError::OverDispense ──► host       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, shortfall)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core simulation errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The change calculator could not reach the target amount exactly.
    ///
    /// ## When This Occurs
    /// - Total stock is worth less than the requested amount
    /// - Stock is worth enough but the greedy walk cannot compose the exact
    ///   amount (no backtracking; see `change` module)
    ///
    /// Amounts are in cents. `short` is what remained unallocated when the
    /// walk exhausted every slot.
    #[error("insufficient stock: requested {requested} cents, short {short} cents")]
    InsufficientStock { requested: i64, short: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            requested: 1500,
            short: 300,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock: requested 1500 cents, short 300 cents"
        );
    }
}
