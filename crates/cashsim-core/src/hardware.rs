//! # Hardware Status Manager
//!
//! Two independent simulated fault flags:
//!
//! - **Jammed** — a mechanical fault; blocks every dispense operation.
//! - **Overlapped** — a cash-validator fault (overlapping notes); blocks
//!   deposit completion until the session is repaid.
//!
//! The flags have no relation to the inventory. They are guard conditions
//! consulted by the controllers and set only through the two entry points
//! below, by whatever external actor simulates faults (a test, a fault
//! injector, a debug panel).

use std::sync::atomic::{AtomicBool, Ordering};

use crate::signal::Signal;

/// Holder of the two simulated fault flags.
///
/// ## Notification Contract
/// `set_jammed`/`set_overlapped` emit their signal on EVERY call, including
/// calls that do not change the value. Subscribers that care about edges
/// de-duplicate themselves.
#[derive(Debug)]
pub struct HardwareStatusManager {
    jammed: AtomicBool,
    overlapped: AtomicBool,
    jammed_changed: Signal<bool>,
    overlapped_changed: Signal<bool>,
}

impl HardwareStatusManager {
    /// Creates a manager with both flags clear.
    pub fn new() -> Self {
        HardwareStatusManager {
            jammed: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            jammed_changed: Signal::new(),
            overlapped_changed: Signal::new(),
        }
    }

    /// Sets the jam flag and notifies unconditionally.
    pub fn set_jammed(&self, jammed: bool) {
        self.jammed.store(jammed, Ordering::SeqCst);
        self.jammed_changed.emit(&jammed);
    }

    /// Sets the validator-overlap flag and notifies unconditionally.
    pub fn set_overlapped(&self, overlapped: bool) {
        self.overlapped.store(overlapped, Ordering::SeqCst);
        self.overlapped_changed.emit(&overlapped);
    }

    /// Current jam state.
    pub fn jammed(&self) -> bool {
        self.jammed.load(Ordering::SeqCst)
    }

    /// Current validator-overlap state.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    /// Jam flag signal.
    pub fn jammed_changed(&self) -> &Signal<bool> {
        &self.jammed_changed
    }

    /// Overlap flag signal.
    pub fn overlapped_changed(&self) -> &Signal<bool> {
        &self.overlapped_changed
    }
}

impl Default for HardwareStatusManager {
    fn default() -> Self {
        HardwareStatusManager::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
