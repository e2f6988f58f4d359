//! # Cash Status Module
//!
//! Threshold-based health classification, one monitor per denomination slot,
//! aggregated into two independent device-wide alarm axes.
//!
//! ## Status Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Status Recomputation Flow                          │
//! │                                                                         │
//! │  inventory.add(key, n)                                                  │
//! │       │ changed signal (synchronous)                                    │
//! │       ▼                                                                 │
//! │  CashStatusMonitor(key) ── classify(count) ──► status signal            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OverallStatusAggregator                                                │
//! │       ├── device_status axis: Empty > NearEmpty > Normal                │
//! │       │   (Full/NearFull ignored on this axis)                          │
//! │       └── full_status axis:   Full > NearFull > Normal                  │
//! │           (Empty/NearEmpty ignored on this axis)                        │
//! │                                                                         │
//! │  Both axes can alarm at once: one slot Empty while another is Full.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification Priority (verbatim, do not reorder)
//! 1. count == 0        → Empty
//! 2. count < nearEmpty → NearEmpty
//! 3. count >= full     → Full
//! 4. count >= nearFull → NearFull
//! 5. otherwise         → Normal
//!
//! Emptiness is checked before fullness on purpose: under inverted
//! thresholds (e.g. full <= nearEmpty) the emptiness arms still win. The
//! chain is the contract; there is no "sensible" reinterpretation.

use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::denomination::DenominationKey;
use crate::inventory::Inventory;
use crate::signal::Signal;

// =============================================================================
// Cash Status
// =============================================================================

/// Health of one denomination slot, or of a device-wide axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CashStatus {
    /// Not yet classified (pre-construction placeholder).
    Unknown,
    /// Slot holds zero pieces.
    Empty,
    /// Slot is below the near-empty threshold.
    NearEmpty,
    /// Slot is inside the comfortable band.
    Normal,
    /// Slot is at or above the near-full threshold.
    NearFull,
    /// Slot is at or above the full threshold.
    Full,
}

// =============================================================================
// Thresholds
// =============================================================================

/// Classification thresholds for one slot.
///
/// Assumed ascending (`near_empty < near_full <= full`) but never validated:
/// misconfigured values are classified by the literal priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Counts strictly below this are NearEmpty.
    pub near_empty: i64,
    /// Counts at or above this are NearFull.
    pub near_full: i64,
    /// Counts at or above this are Full.
    pub full: i64,
}

impl Thresholds {
    /// Creates a threshold triple.
    pub const fn new(near_empty: i64, near_full: i64, full: i64) -> Self {
        Thresholds {
            near_empty,
            near_full,
            full,
        }
    }
}

/// Classifies a count against thresholds.
///
/// The arm order IS the contract; see the module docs.
fn classify(count: i64, thresholds: &Thresholds) -> CashStatus {
    if count == 0 {
        CashStatus::Empty
    } else if count < thresholds.near_empty {
        CashStatus::NearEmpty
    } else if count >= thresholds.full {
        CashStatus::Full
    } else if count >= thresholds.near_full {
        CashStatus::NearFull
    } else {
        CashStatus::Normal
    }
}

// =============================================================================
// Per-Slot Monitor
// =============================================================================

/// Threshold classifier for a single denomination slot.
///
/// Attached to an inventory at construction; reclassifies on every inventory
/// change matching its key and on every threshold update, emitting the new
/// status each time (no de-duplication).
#[derive(Debug)]
pub struct CashStatusMonitor {
    key: DenominationKey,
    thresholds: Mutex<Thresholds>,
    count: Mutex<i64>,
    status: Mutex<CashStatus>,
    changed: Signal<CashStatus>,
}

impl CashStatusMonitor {
    /// Builds a monitor for `key`, classifies the current count immediately,
    /// and subscribes it to the inventory's change signal.
    ///
    /// The subscription holds the inventory weakly so the inventory's signal
    /// does not keep itself alive through its own subscribers.
    pub fn attach(
        key: DenominationKey,
        thresholds: Thresholds,
        inventory: &Arc<Inventory>,
    ) -> Arc<Self> {
        let monitor = Arc::new(CashStatusMonitor {
            key: key.clone(),
            thresholds: Mutex::new(thresholds),
            count: Mutex::new(inventory.count(&key)),
            status: Mutex::new(CashStatus::Unknown),
            changed: Signal::new(),
        });
        monitor.recompute();

        let weak_inventory = Arc::downgrade(inventory);
        let subscriber = Arc::clone(&monitor);
        inventory.changed().subscribe(move |changed_key| {
            if *changed_key == subscriber.key {
                if let Some(inventory) = weak_inventory.upgrade() {
                    subscriber.observe(inventory.count(changed_key));
                }
            }
        });

        monitor
    }

    /// The slot this monitor classifies.
    pub fn key(&self) -> &DenominationKey {
        &self.key
    }

    /// Current classification.
    pub fn status(&self) -> CashStatus {
        *self.status.lock().expect("monitor mutex poisoned")
    }

    /// Replaces the thresholds and reclassifies immediately.
    pub fn update_thresholds(&self, thresholds: Thresholds) {
        *self.thresholds.lock().expect("monitor mutex poisoned") = thresholds;
        self.recompute();
    }

    /// Status signal; emits on every reclassification.
    pub fn changed(&self) -> &Signal<CashStatus> {
        &self.changed
    }

    fn observe(&self, count: i64) {
        *self.count.lock().expect("monitor mutex poisoned") = count;
        self.recompute();
    }

    fn recompute(&self) {
        let count = *self.count.lock().expect("monitor mutex poisoned");
        let thresholds = *self.thresholds.lock().expect("monitor mutex poisoned");
        let status = classify(count, &thresholds);
        *self.status.lock().expect("monitor mutex poisoned") = status;
        self.changed.emit(&status);
    }
}

// =============================================================================
// Device-Wide Aggregator
// =============================================================================

/// Combines every slot monitor into two independent alarm axes.
///
/// ## Axes
/// - `device_status` — the low-stock axis. Empty beats NearEmpty beats
///   Normal; Full/NearFull slots contribute nothing here.
/// - `full_status` — the overstock axis. Full beats NearFull beats Normal;
///   Empty/NearEmpty slots contribute nothing here.
///
/// Both recompute on every underlying monitor emission, so one slot running
/// dry never masks another overflowing.
#[derive(Debug)]
pub struct OverallStatusAggregator {
    monitors: Vec<Arc<CashStatusMonitor>>,
    device_status: Mutex<CashStatus>,
    full_status: Mutex<CashStatus>,
    device_changed: Signal<CashStatus>,
    full_changed: Signal<CashStatus>,
}

impl OverallStatusAggregator {
    /// Builds the aggregator over `monitors` and computes both axes from
    /// their current statuses.
    ///
    /// Monitor subscriptions hold the aggregator weakly: the aggregator owns
    /// the monitors, so a strong capture would cycle.
    pub fn attach(monitors: Vec<Arc<CashStatusMonitor>>) -> Arc<Self> {
        let aggregator = Arc::new(OverallStatusAggregator {
            monitors,
            device_status: Mutex::new(CashStatus::Unknown),
            full_status: Mutex::new(CashStatus::Unknown),
            device_changed: Signal::new(),
            full_changed: Signal::new(),
        });
        aggregator.recompute();

        for monitor in &aggregator.monitors {
            let weak: Weak<OverallStatusAggregator> = Arc::downgrade(&aggregator);
            monitor.changed().subscribe(move |_| {
                if let Some(aggregator) = weak.upgrade() {
                    aggregator.recompute();
                }
            });
        }

        aggregator
    }

    /// Low-stock axis.
    pub fn device_status(&self) -> CashStatus {
        *self.device_status.lock().expect("aggregator mutex poisoned")
    }

    /// Overstock axis.
    pub fn full_status(&self) -> CashStatus {
        *self.full_status.lock().expect("aggregator mutex poisoned")
    }

    /// Low-stock axis signal.
    pub fn device_changed(&self) -> &Signal<CashStatus> {
        &self.device_changed
    }

    /// Overstock axis signal.
    pub fn full_changed(&self) -> &Signal<CashStatus> {
        &self.full_changed
    }

    /// The monitors this aggregator combines.
    pub fn monitors(&self) -> &[Arc<CashStatusMonitor>] {
        &self.monitors
    }

    /// Finds the monitor for a given slot, if one exists.
    pub fn monitor_for(&self, key: &DenominationKey) -> Option<&Arc<CashStatusMonitor>> {
        self.monitors.iter().find(|m| m.key() == key)
    }

    fn recompute(&self) {
        let mut any_empty = false;
        let mut any_near_empty = false;
        let mut any_full = false;
        let mut any_near_full = false;

        for monitor in &self.monitors {
            // Exhaustive on purpose: adding a status variant must force a
            // decision about which axis it feeds.
            match monitor.status() {
                CashStatus::Empty => any_empty = true,
                CashStatus::NearEmpty => any_near_empty = true,
                CashStatus::Full => any_full = true,
                CashStatus::NearFull => any_near_full = true,
                CashStatus::Normal | CashStatus::Unknown => {}
            }
        }

        let device = if any_empty {
            CashStatus::Empty
        } else if any_near_empty {
            CashStatus::NearEmpty
        } else {
            CashStatus::Normal
        };

        let full = if any_full {
            CashStatus::Full
        } else if any_near_full {
            CashStatus::NearFull
        } else {
            CashStatus::Normal
        };

        *self.device_status.lock().expect("aggregator mutex poisoned") = device;
        *self.full_status.lock().expect("aggregator mutex poisoned") = full;
        self.device_changed.emit(&device);
        self.full_changed.emit(&full);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
