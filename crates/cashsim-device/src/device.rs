//! # Device Wiring
//!
//! Assembles one simulated cash changer from a [`SimulatorConfig`]: the
//! shared inventory and history, a monitor per configured slot, the
//! two-axis aggregator, the hardware fault flags, and both controllers.
//!
//! The device is an in-process object. Open/claim/release/close lifecycle
//! enforcement belongs to the host's peripheral framework, which is expected
//! to gate calls before they reach this object.

use std::sync::Arc;

use tracing::info;

use cashsim_core::{
    CashStatusMonitor, HardwareStatusManager, Inventory, OverallStatusAggregator,
    TransactionHistory,
};

use crate::config::SimulatorConfig;
use crate::deposit::DepositController;
use crate::dispense::DispenseController;
use crate::faults::FaultInjector;
use crate::manager::CashChangerManager;

/// A fully wired simulated cash changer.
///
/// ## Ownership
/// Inventory and history are single shared instances reachable from both
/// controllers and the manager. Each controller exclusively owns its own
/// state machine. The hardware manager is shared and mutated only through
/// its two fault entry points.
#[derive(Debug)]
pub struct CashChangerDevice {
    config: SimulatorConfig,
    inventory: Arc<Inventory>,
    history: Arc<TransactionHistory>,
    hardware: Arc<HardwareStatusManager>,
    aggregator: Arc<OverallStatusAggregator>,
    manager: CashChangerManager,
    deposit: DepositController,
    dispense: DispenseController,
}

impl CashChangerDevice {
    /// Wires a device with an entropy-seeded fault injector.
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_injector(config, FaultInjector::new())
    }

    /// Wires a device around a caller-supplied injector (tests seed it for
    /// reproducible fault sequences).
    pub fn with_injector(config: SimulatorConfig, injector: FaultInjector) -> Self {
        let inventory = Arc::new(Inventory::new());
        let history = Arc::new(TransactionHistory::new());
        let hardware = Arc::new(HardwareStatusManager::new());
        let injector = Arc::new(injector);

        // Seed the float before monitors attach: the initial load predates
        // the transaction log, so nothing is recorded for it.
        for slot in &config.initial_counts {
            inventory.set_count(&config.slot_key(slot), slot.count);
        }

        let monitors: Vec<Arc<CashStatusMonitor>> = config
            .initial_counts
            .iter()
            .map(|slot| {
                let key = config.slot_key(slot);
                let thresholds = config.thresholds_for(&key);
                CashStatusMonitor::attach(key, thresholds, &inventory)
            })
            .collect();
        let aggregator = OverallStatusAggregator::attach(monitors);

        let manager = CashChangerManager::new(Arc::clone(&inventory), Arc::clone(&history));

        let deposit = DepositController::new(
            manager.clone(),
            Arc::clone(&hardware),
            Arc::clone(&injector),
            config.deposit_fault,
            config.currency_code.clone(),
        );
        let dispense = DispenseController::new(
            manager.clone(),
            Arc::clone(&hardware),
            Arc::clone(&injector),
            config.delay,
            config.dispense_fault,
        );

        info!(
            currency = %config.currency_code,
            slots = config.initial_counts.len(),
            total = %inventory.total(None),
            "cash changer device wired"
        );

        CashChangerDevice {
            config,
            inventory,
            history,
            hardware,
            aggregator,
            manager,
            deposit,
            dispense,
        }
    }

    /// The configuration the device was built from.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The shared inventory ledger.
    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// The shared transaction log.
    pub fn history(&self) -> &Arc<TransactionHistory> {
        &self.history
    }

    /// The simulated fault flags.
    pub fn hardware(&self) -> &Arc<HardwareStatusManager> {
        &self.hardware
    }

    /// The two-axis device status.
    pub fn status(&self) -> &Arc<OverallStatusAggregator> {
        &self.aggregator
    }

    /// The money-movement orchestrator.
    pub fn manager(&self) -> &CashChangerManager {
        &self.manager
    }

    /// The accept-cash state machine.
    pub fn deposit(&self) -> &DepositController {
        &self.deposit
    }

    /// The pay-out state machine.
    pub fn dispense(&self) -> &DispenseController {
        &self.dispense
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
