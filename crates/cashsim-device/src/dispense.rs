//! # Dispense Controller
//!
//! The pay-out state machine. At most one dispense is in flight per
//! controller; a second caller fails fast with Busy rather than queuing.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dispense State Machine                               │
//! │                                                                         │
//! │              ┌────────── success ──────────┐                            │
//! │              ▼                             │                            │
//! │   Idle ── dispense_* ──► Busy ── body ─────┤                            │
//! │    ▲                      │                └─ failure ──► Error         │
//! │    │                      │ (second caller: E_BUSY, fail fast)          │
//! │    └───── clear_error ◄───┴──────────────────────────────┘              │
//! │                                                                         │
//! │   Body: simulated delay ──► simulated fault roll ──► manager action    │
//! │                                                                         │
//! │   ORDERING: status becomes Busy synchronously BEFORE the async body    │
//! │   is spawned. A concurrent caller observing Busy knows the operation   │
//! │   has begun, never merely "about to begin". No cancellation: once the  │
//! │   body starts it runs to completion.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completion Delivery
//! The completion callback fires exactly once per call, guard failures
//! included. A synchronously awaited call additionally sees the failure as
//! its own `Err`; an async caller sees it only through the callback (the
//! spawned body's error is logged, not silently dropped).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cashsim_core::{DenominationKey, HardwareStatusManager, Money, Signal};

use crate::config::{DelayConfig, FaultConfig};
use crate::error::{codes, DeviceError, DeviceResult};
use crate::faults::FaultInjector;
use crate::manager::CashChangerManager;

// =============================================================================
// States and Requests
// =============================================================================

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispenseStatus {
    /// Ready for a dispense.
    Idle,
    /// A dispense body is running.
    Busy,
    /// The last dispense failed; requires `clear_error`.
    Error,
}

/// Whether the caller blocks on the dispense body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseMode {
    /// The call suspends until the body completes; failures surface both
    /// through the callback and as the call's own error.
    Sync,
    /// The body runs on a spawned task; the call returns once the spawn is
    /// in flight and the result is delivered solely via the callback.
    Async,
}

/// Completion callback: `(result_code, extended_code)`, UnifiedPOS values.
pub type CompletionCallback = Box<dyn FnOnce(i32, i32) + Send + 'static>;

/// What the body should pay out.
enum DispenseRequest {
    /// Greedy change for an amount, optionally restricted to one currency.
    Change {
        amount: Money,
        currency: Option<String>,
    },
    /// An explicit per-denomination breakdown.
    Cash { counts: BTreeMap<DenominationKey, i64> },
}

// =============================================================================
// Dispense Controller
// =============================================================================

#[derive(Debug)]
struct DispenseInner {
    status: Mutex<DispenseStatus>,
    manager: CashChangerManager,
    hardware: Arc<HardwareStatusManager>,
    injector: Arc<FaultInjector>,
    delay: DelayConfig,
    fault: FaultConfig,
    changed: Signal<DispenseStatus>,
}

/// The pay-out state machine. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct DispenseController {
    inner: Arc<DispenseInner>,
}

impl DispenseController {
    /// Builds the controller over the shared manager and fault surfaces.
    pub fn new(
        manager: CashChangerManager,
        hardware: Arc<HardwareStatusManager>,
        injector: Arc<FaultInjector>,
        delay: DelayConfig,
        fault: FaultConfig,
    ) -> Self {
        DispenseController {
            inner: Arc::new(DispenseInner {
                status: Mutex::new(DispenseStatus::Idle),
                manager,
                hardware,
                injector,
                delay,
                fault,
                changed: Signal::new(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> DispenseStatus {
        *self.inner.status.lock().expect("dispense mutex poisoned")
    }

    /// Status signal; emits on every transition.
    pub fn changed(&self) -> &Signal<DispenseStatus> {
        &self.inner.changed
    }

    /// Pays out `amount` as greedy change.
    pub async fn dispense_change(
        &self,
        amount: Money,
        currency: Option<String>,
        mode: DispenseMode,
        on_complete: CompletionCallback,
    ) -> DeviceResult<()> {
        self.dispense(DispenseRequest::Change { amount, currency }, mode, on_complete)
            .await
    }

    /// Pays out an explicit breakdown.
    pub async fn dispense_cash(
        &self,
        counts: BTreeMap<DenominationKey, i64>,
        mode: DispenseMode,
        on_complete: CompletionCallback,
    ) -> DeviceResult<()> {
        self.dispense(DispenseRequest::Cash { counts }, mode, on_complete)
            .await
    }

    /// Resets Error to Idle. No-op in any other state, including repeated
    /// calls while already Idle.
    pub fn clear_error(&self) {
        let cleared = {
            let mut status = self.inner.status.lock().expect("dispense mutex poisoned");
            if *status == DispenseStatus::Error {
                *status = DispenseStatus::Idle;
                true
            } else {
                false
            }
        };
        if cleared {
            info!("dispense error cleared");
            self.inner.changed.emit(&DispenseStatus::Idle);
        }
    }

    /// Guard checks, the synchronous Busy transition, then the body.
    async fn dispense(
        &self,
        request: DispenseRequest,
        mode: DispenseMode,
        on_complete: CompletionCallback,
    ) -> DeviceResult<()> {
        {
            let mut status = self.inner.status.lock().expect("dispense mutex poisoned");
            if *status == DispenseStatus::Busy {
                drop(status);
                warn!("dispense rejected: busy");
                on_complete(codes::E_BUSY, 0);
                return Err(DeviceError::Busy);
            }
            if self.inner.hardware.jammed() {
                drop(status);
                warn!("dispense rejected: jammed");
                on_complete(codes::E_FAILURE, 0);
                return Err(DeviceError::Jammed);
            }
            *status = DispenseStatus::Busy;
        }
        self.inner.changed.emit(&DispenseStatus::Busy);

        match mode {
            DispenseMode::Sync => self.inner.run(request, on_complete).await,
            DispenseMode::Async => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    if let Err(err) = inner.run(request, on_complete).await {
                        // Async callers only get the callback; keep a trace
                        warn!(%err, "async dispense failed");
                    }
                });
                Ok(())
            }
        }
    }
}

impl DispenseInner {
    /// The dispense body: delay, fault roll, then the manager action.
    /// Runs to completion; there is no cancellation path.
    async fn run(&self, request: DispenseRequest, on_complete: CompletionCallback) -> DeviceResult<()> {
        if let Some(delay) = self.injector.delay_for(&self.delay) {
            debug!(?delay, "simulated mechanical delay");
            tokio::time::sleep(delay).await;
        }

        if self.injector.should_fail(&self.fault) {
            self.transition(DispenseStatus::Error);
            on_complete(codes::E_FAILURE, 0);
            return Err(DeviceError::Failure {
                reason: "simulated dispense fault".to_string(),
            });
        }

        let outcome = match request {
            DispenseRequest::Change { amount, currency } => self
                .manager
                .dispense_amount(amount, currency.as_deref())
                .map(|_| ()),
            DispenseRequest::Cash { counts } => {
                self.manager.dispense_counts(&counts);
                Ok(())
            }
        };

        match outcome {
            Ok(()) => {
                self.transition(DispenseStatus::Idle);
                on_complete(codes::SUCCESS, 0);
                Ok(())
            }
            Err(core_err) => {
                self.transition(DispenseStatus::Error);
                on_complete(codes::E_EXTENDED, codes::ECHAN_OVERDISPENSE);
                Err(DeviceError::OverDispense(core_err))
            }
        }
    }

    fn transition(&self, status: DispenseStatus) {
        *self.status.lock().expect("dispense mutex poisoned") = status;
        self.changed.emit(&status);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cashsim_core::{Inventory, TransactionHistory};
    use tokio::sync::oneshot;

    fn bill(cents: i64) -> DenominationKey {
        DenominationKey::bill(Money::from_cents(cents), "USD")
    }

    fn fixture(delay: DelayConfig, fault: FaultConfig) -> DispenseController {
        let inventory = Arc::new(Inventory::new());
        inventory.set_count(&bill(500), 10);
        inventory.set_count(&bill(100), 10);
        let manager =
            CashChangerManager::new(inventory, Arc::new(TransactionHistory::new()));
        DispenseController::new(
            manager,
            Arc::new(HardwareStatusManager::new()),
            Arc::new(FaultInjector::seeded(3)),
            delay,
            fault,
        )
    }

    fn callback() -> (CompletionCallback, oneshot::Receiver<(i32, i32)>) {
        let (tx, rx) = oneshot::channel();
        (
            Box::new(move |code, extended| {
                let _ = tx.send((code, extended));
            }),
            rx,
        )
    }

    #[tokio::test]
    async fn test_sync_dispense_success() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        let (cb, rx) = callback();

        ctrl.dispense_change(Money::from_cents(700), None, DispenseMode::Sync, cb)
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), (codes::SUCCESS, 0));
        assert_eq!(ctrl.status(), DispenseStatus::Idle);
        assert_eq!(ctrl.inner.manager.inventory().total(None).cents(), 5300);
    }

    #[tokio::test]
    async fn test_dispense_cash_pays_exact_counts() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        let (cb, rx) = callback();

        let mut counts = BTreeMap::new();
        counts.insert(bill(100), 4);
        ctrl.dispense_cash(counts, DispenseMode::Sync, cb)
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), (codes::SUCCESS, 0));
        assert_eq!(ctrl.inner.manager.inventory().count(&bill(100)), 6);
    }

    #[tokio::test]
    async fn test_jammed_fails_fast_without_moving_cash() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        ctrl.inner.hardware.set_jammed(true);
        let (cb, rx) = callback();

        let err = ctrl
            .dispense_change(Money::from_cents(500), None, DispenseMode::Sync, cb)
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::Jammed));
        assert_eq!(rx.await.unwrap(), (codes::E_FAILURE, 0));
        assert_eq!(ctrl.status(), DispenseStatus::Idle);
        assert_eq!(ctrl.inner.manager.inventory().total(None).cents(), 6000);
    }

    #[tokio::test]
    async fn test_busy_rejects_second_caller() {
        let delay = DelayConfig {
            enabled: true,
            min_ms: 100,
            max_ms: 100,
        };
        let ctrl = fixture(delay, FaultConfig::disabled());

        let (cb1, rx1) = callback();
        ctrl.dispense_change(Money::from_cents(500), None, DispenseMode::Async, cb1)
            .await
            .unwrap();

        // Busy was set before the spawn, so it is observable immediately
        assert_eq!(ctrl.status(), DispenseStatus::Busy);

        let (cb2, rx2) = callback();
        let err = ctrl
            .dispense_change(Money::from_cents(100), None, DispenseMode::Sync, cb2)
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Busy));
        assert_eq!(rx2.await.unwrap(), (codes::E_BUSY, 0));

        // First dispense still completes
        assert_eq!(rx1.await.unwrap(), (codes::SUCCESS, 0));
        assert_eq!(ctrl.status(), DispenseStatus::Idle);
    }

    #[tokio::test]
    async fn test_over_dispense_enters_error_until_cleared() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        let (cb, rx) = callback();

        let err = ctrl
            .dispense_change(Money::from_cents(100_000), None, DispenseMode::Sync, cb)
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::OverDispense(_)));
        assert_eq!(err.code(), codes::E_EXTENDED);
        assert_eq!(err.extended_code(), codes::ECHAN_OVERDISPENSE);
        assert_eq!(rx.await.unwrap(), (codes::E_EXTENDED, codes::ECHAN_OVERDISPENSE));
        assert_eq!(ctrl.status(), DispenseStatus::Error);
        // Stock untouched by the failed attempt
        assert_eq!(ctrl.inner.manager.inventory().total(None).cents(), 6000);

        ctrl.clear_error();
        assert_eq!(ctrl.status(), DispenseStatus::Idle);
    }

    #[tokio::test]
    async fn test_simulated_fault_enters_error() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::certain());
        let (cb, rx) = callback();

        let err = ctrl
            .dispense_change(Money::from_cents(500), None, DispenseMode::Sync, cb)
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::Failure { .. }));
        assert_eq!(rx.await.unwrap(), (codes::E_FAILURE, 0));
        assert_eq!(ctrl.status(), DispenseStatus::Error);
        assert_eq!(ctrl.inner.manager.inventory().total(None).cents(), 6000);
    }

    #[tokio::test]
    async fn test_async_failure_reaches_callback() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        let (cb, rx) = callback();

        ctrl.dispense_change(Money::from_cents(100_000), None, DispenseMode::Async, cb)
            .await
            .unwrap();

        assert_eq!(
            rx.await.unwrap(),
            (codes::E_EXTENDED, codes::ECHAN_OVERDISPENSE)
        );
        assert_eq!(ctrl.status(), DispenseStatus::Error);
    }

    #[tokio::test]
    async fn test_clear_error_is_idempotent_when_idle() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());

        ctrl.clear_error();
        ctrl.clear_error();
        assert_eq!(ctrl.status(), DispenseStatus::Idle);
    }

    #[tokio::test]
    async fn test_status_signal_tracks_transitions() {
        let ctrl = fixture(DelayConfig::default(), FaultConfig::disabled());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        ctrl.changed().subscribe(move |status: &DispenseStatus| {
            log.lock().unwrap().push(*status);
        });

        let (cb, _rx) = callback();
        ctrl.dispense_change(Money::from_cents(500), None, DispenseMode::Sync, cb)
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![DispenseStatus::Busy, DispenseStatus::Idle]
        );
    }
}
