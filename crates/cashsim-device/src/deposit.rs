//! # Deposit Controller
//!
//! The accept-cash state machine. One logical operator drives one session
//! at a time; the controller owns the session state exclusively.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Deposit State Machine                                │
//! │                                                                         │
//! │   None ──begin_deposit()──► Start ──(immediately)──► Count             │
//! │                                                        │                │
//! │              track_deposit / track_bulk_deposit ───────┤ (loops)        │
//! │              pause_deposit(Pause|Restart)      ────────┤                │
//! │              fix_deposit()  [sets fixed]       ────────┤                │
//! │                                                        │                │
//! │   End ◄──────────────── end_deposit(action) ───────────┘                │
//! │                                                                         │
//! │   Orthogonal flags: paused (gate on tracking)                           │
//! │                     fixed  (gate on end_deposit)                        │
//! │                                                                         │
//! │   IMMEDIATE COMMIT: every tracked piece hits the inventory the moment  │
//! │   it is accepted. end_deposit(Repay) reverses that commit in full.     │
//! │   "What you see is what's in the machine" — do not defer the commit.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fault Interplay
//! Each tracked (key, count) rolls the deposit-path fault knob. A hit sets
//! the validator-overlap flag and abandons the rest of that call; the cash
//! already accepted stays committed. While Overlapped, tracking is gated
//! and `end_deposit(NoChange|Change)` fails — only `Repay` (or a fresh
//! `begin_deposit`) resolves the session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cashsim_core::{
    ChangeCalculator, DenominationKey, HardwareStatusManager, Money, Signal, TransactionEntry,
    TransactionType,
};

use crate::config::FaultConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::faults::FaultInjector;
use crate::manager::CashChangerManager;

// =============================================================================
// States and Requests
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepositStatus {
    /// No session has ever been opened.
    None,
    /// Session opened; transitions to Count inside `begin_deposit`.
    Start,
    /// Session accepting cash.
    Count,
    /// Session finalized.
    End,
}

/// How to finalize a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepositAction {
    /// Return every tracked piece to the customer (reverses the commit).
    Repay,
    /// Keep the deposit as-is.
    NoChange,
    /// Keep the deposit and pay the session amount back out as change.
    Change,
}

/// Pause-state transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PauseRequest {
    /// Suspend tracking.
    Pause,
    /// Resume tracking.
    Restart,
}

/// Read-only view of the session, emitted on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSnapshot {
    pub status: DepositStatus,
    pub amount: Money,
    pub counts: BTreeMap<DenominationKey, i64>,
    pub paused: bool,
    pub fixed: bool,
}

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug)]
struct Session {
    status: DepositStatus,
    amount: Money,
    counts: BTreeMap<DenominationKey, i64>,
    paused: bool,
    fixed: bool,
}

impl Session {
    fn new() -> Self {
        Session {
            status: DepositStatus::None,
            amount: Money::zero(),
            counts: BTreeMap::new(),
            paused: false,
            fixed: false,
        }
    }

    fn snapshot(&self) -> DepositSnapshot {
        DepositSnapshot {
            status: self.status,
            amount: self.amount,
            counts: self.counts.clone(),
            paused: self.paused,
            fixed: self.fixed,
        }
    }

    /// True when session-mutating calls are inside their legal window.
    fn in_session(&self) -> bool {
        matches!(self.status, DepositStatus::Start | DepositStatus::Count)
    }
}

// =============================================================================
// Deposit Controller
// =============================================================================

/// The accept-cash state machine.
///
/// Not designed for concurrent mutation: callers serialize deposit
/// operations, matching a single physical device with one operator.
#[derive(Debug)]
pub struct DepositController {
    session: Mutex<Session>,
    manager: CashChangerManager,
    hardware: Arc<HardwareStatusManager>,
    injector: Arc<FaultInjector>,
    fault: FaultConfig,
    currency: String,
    changed: Signal<DepositSnapshot>,
}

impl DepositController {
    /// Builds the controller over the shared manager and fault surfaces.
    pub fn new(
        manager: CashChangerManager,
        hardware: Arc<HardwareStatusManager>,
        injector: Arc<FaultInjector>,
        fault: FaultConfig,
        currency: impl Into<String>,
    ) -> Self {
        DepositController {
            session: Mutex::new(Session::new()),
            manager,
            hardware,
            injector,
            fault,
            currency: currency.into(),
            changed: Signal::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current lifecycle state.
    pub fn status(&self) -> DepositStatus {
        self.lock().status
    }

    /// Accumulated session amount.
    pub fn amount(&self) -> Money {
        self.lock().amount
    }

    /// Accumulated session counts.
    pub fn counts(&self) -> BTreeMap<DenominationKey, i64> {
        self.lock().counts.clone()
    }

    /// Whether tracking is paused.
    pub fn paused(&self) -> bool {
        self.lock().paused
    }

    /// Whether the session totals are locked in.
    pub fn fixed(&self) -> bool {
        self.lock().fixed
    }

    /// Session-changed signal; emits a fresh snapshot after every mutation.
    pub fn changed(&self) -> &Signal<DepositSnapshot> {
        &self.changed
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Opens a session. Always legal: resets totals and flags, clears the
    /// validator-overlap fault, and lands in Count (Start is passed through
    /// inside this call).
    pub fn begin_deposit(&self) {
        let snapshot = {
            let mut session = self.lock();
            session.status = DepositStatus::Start;
            session.amount = Money::zero();
            session.counts.clear();
            session.paused = false;
            session.fixed = false;
            session.status = DepositStatus::Count;
            session.snapshot()
        };
        self.hardware.set_overlapped(false);
        info!("deposit session opened");
        self.changed.emit(&snapshot);
    }

    /// Tracks one accepted piece of `key`.
    pub fn track_deposit(&self, key: &DenominationKey) {
        let mut counts = BTreeMap::new();
        counts.insert(key.clone(), 1);
        self.track_bulk_deposit(&counts);
    }

    /// Tracks a batch of accepted pieces.
    ///
    /// ## Behavior
    /// - Silent no-op unless the session is in Count, not paused, and the
    ///   validator is not overlapped.
    /// - Entries with non-positive counts are skipped.
    /// - Each entry rolls the validation-fault knob once. A hit sets the
    ///   overlap flag and abandons the remaining entries; pieces accepted
    ///   before the hit stay committed.
    /// - Accepted pieces hit the inventory IMMEDIATELY, not at end_deposit.
    pub fn track_bulk_deposit(&self, counts: &BTreeMap<DenominationKey, i64>) {
        {
            let session = self.lock();
            if session.status != DepositStatus::Count
                || session.paused
                || self.hardware.overlapped()
            {
                debug!(status = ?session.status, paused = session.paused, "track ignored");
                return;
            }
        }

        let mut overlap_hit = false;
        let snapshot = {
            for (key, count) in counts {
                if *count <= 0 {
                    continue;
                }
                if self.injector.should_fail(&self.fault) {
                    warn!(%key, "validation failure injected, overlap raised");
                    overlap_hit = true;
                    break;
                }

                // Commit this entry: session totals and physical inventory
                {
                    let mut session = self.lock();
                    session.amount += key.value.multiply_quantity(*count);
                    *session.counts.entry(key.clone()).or_insert(0) += count;
                }
                self.manager.inventory().add(key, *count);
                debug!(%key, count, "deposit tracked");
            }
            self.lock().snapshot()
        };

        if overlap_hit {
            self.hardware.set_overlapped(true);
        }
        self.changed.emit(&snapshot);
    }

    /// Locks in the session totals prior to finalizing.
    pub fn fix_deposit(&self) -> DeviceResult<()> {
        let snapshot = {
            let mut session = self.lock();
            if !session.in_session() {
                return Err(DeviceError::IllegalSequence {
                    operation: "fix_deposit",
                    reason: "no deposit session in progress",
                });
            }
            session.fixed = true;
            session.snapshot()
        };
        debug!("deposit fixed");
        self.changed.emit(&snapshot);
        Ok(())
    }

    /// Suspends or resumes tracking.
    ///
    /// Requesting the state already in effect (double pause, double resume)
    /// is an illegal sequence.
    pub fn pause_deposit(&self, request: PauseRequest) -> DeviceResult<()> {
        let snapshot = {
            let mut session = self.lock();
            if !session.in_session() {
                return Err(DeviceError::IllegalSequence {
                    operation: "pause_deposit",
                    reason: "no deposit session in progress",
                });
            }
            let pausing = request == PauseRequest::Pause;
            if session.paused == pausing {
                return Err(DeviceError::IllegalSequence {
                    operation: "pause_deposit",
                    reason: "requested pause state already in effect",
                });
            }
            session.paused = pausing;
            session.snapshot()
        };
        debug!(paused = snapshot.paused, "deposit pause toggled");
        self.changed.emit(&snapshot);
        Ok(())
    }

    /// Finalizes the session.
    ///
    /// ## Behavior
    /// - Illegal sequence unless `fix_deposit` was called first.
    /// - `Repay`: every tracked piece is subtracted back out of the
    ///   inventory (the physical return of the customer's cash). Nothing is
    ///   logged; the session nets to zero.
    /// - `NoChange`/`Change`: device failure while the overlap flag is set.
    ///   Otherwise the session is logged as one Deposit entry; `Change`
    ///   additionally pays the session amount back out (its own Dispense
    ///   entry). The change breakdown is computed before anything is
    ///   logged, so a payout the stock cannot compose fails with nothing
    ///   recorded and the session still fixed and retryable.
    /// - On success: status End, pause/fix flags cleared, overlap cleared.
    pub fn end_deposit(&self, action: DepositAction) -> DeviceResult<()> {
        let (amount, counts) = {
            let session = self.lock();
            if !session.fixed {
                return Err(DeviceError::IllegalSequence {
                    operation: "end_deposit",
                    reason: "deposit not fixed",
                });
            }
            (session.amount, session.counts.clone())
        };

        match action {
            DepositAction::Repay => {
                for (key, count) in &counts {
                    self.manager.inventory().add(key, -count);
                }
                info!(amount = %amount, "deposit repaid");
            }
            DepositAction::NoChange | DepositAction::Change => {
                if self.hardware.overlapped() {
                    return Err(DeviceError::Overlapped);
                }
                // Work out the payout before touching the log: if the stock
                // cannot compose the amount the session must fail with
                // nothing recorded, still fixed, and retryable.
                let payout = if action == DepositAction::Change && amount.is_positive() {
                    Some(ChangeCalculator::calculate(
                        self.manager.inventory(),
                        amount,
                        Some(&self.currency),
                    )?)
                } else {
                    None
                };
                if !counts.is_empty() {
                    // The inventory was already mutated piece by piece while
                    // tracking; the log gets the session as one movement.
                    self.manager.history().add(TransactionEntry::new(
                        TransactionType::Deposit,
                        amount,
                        counts.clone(),
                    ));
                }
                if let Some(breakdown) = payout {
                    self.manager.dispense_counts(&breakdown);
                }
                info!(amount = %amount, ?action, "deposit finalized");
            }
        }

        let snapshot = {
            let mut session = self.lock();
            session.status = DepositStatus::End;
            session.paused = false;
            session.fixed = false;
            session.snapshot()
        };
        self.hardware.set_overlapped(false);
        self.changed.emit(&snapshot);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().expect("deposit session mutex poisoned")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
