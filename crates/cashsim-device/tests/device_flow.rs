//! End-to-end flows across a fully wired device: deposit sessions, dispense
//! outcomes, the fault gates, and the status pipeline reacting to real
//! money movements.

use std::collections::BTreeMap;
use std::sync::Arc;

use cashsim_core::{CashKind, CashStatus, DenominationKey, Money, Thresholds};
use cashsim_device::{
    codes, CashChangerDevice, DelayConfig, DepositAction, DeviceError, DispenseMode,
    DispenseStatus, FaultConfig, FaultInjector, PauseRequest, SimulatorConfig, SlotConfig,
};
use tokio::sync::oneshot;

type Callback = (
    Box<dyn FnOnce(i32, i32) + Send + 'static>,
    oneshot::Receiver<(i32, i32)>,
);

fn callback() -> Callback {
    let (tx, rx) = oneshot::channel();
    (
        Box::new(move |code, extended| {
            let _ = tx.send((code, extended));
        }),
        rx,
    )
}

fn bill(cents: i64) -> DenominationKey {
    DenominationKey::bill(Money::from_cents(cents), "USD")
}

fn coin(cents: i64) -> DenominationKey {
    DenominationKey::coin(Money::from_cents(cents), "USD")
}

/// A small float with tight thresholds so status changes are easy to drive.
fn test_config() -> SimulatorConfig {
    SimulatorConfig {
        initial_counts: vec![
            SlotConfig::new(500, CashKind::Bill, 5),
            SlotConfig::new(100, CashKind::Bill, 5),
            SlotConfig::new(25, CashKind::Coin, 5),
        ],
        thresholds: Thresholds::new(2, 8, 10),
        ..SimulatorConfig::default()
    }
}

fn test_device() -> CashChangerDevice {
    CashChangerDevice::with_injector(test_config(), FaultInjector::seeded(17))
}

// =============================================================================
// Deposit flows
// =============================================================================

#[test]
fn deposit_repay_leaves_inventory_unchanged() {
    let device = test_device();
    let before = device.inventory().count(&bill(500));

    let deposit = device.deposit();
    deposit.begin_deposit();
    deposit.track_deposit(&bill(500));
    deposit.fix_deposit().unwrap();
    deposit.end_deposit(DepositAction::Repay).unwrap();

    assert_eq!(device.inventory().count(&bill(500)), before);
}

#[test]
fn deposit_no_change_commits_the_cash() {
    let device = test_device();
    let before = device.inventory().count(&bill(500));

    let deposit = device.deposit();
    deposit.begin_deposit();
    deposit.track_deposit(&bill(500));
    deposit.fix_deposit().unwrap();
    deposit.end_deposit(DepositAction::NoChange).unwrap();

    assert_eq!(device.inventory().count(&bill(500)), before + 1);
}

#[test]
fn deposit_change_pays_the_session_amount_back_out() {
    let device = test_device();
    let total_before = device.inventory().total(None);

    let deposit = device.deposit();
    deposit.begin_deposit();
    deposit.track_deposit(&bill(500));
    deposit.fix_deposit().unwrap();
    deposit.end_deposit(DepositAction::Change).unwrap();

    // $5 in, $5 back out: the machine's worth is unchanged
    assert_eq!(device.inventory().total(None), total_before);
    // But the $5 slot gained the deposited bill and the payout came from
    // the greedy walk (largest first: the $5 slot again)
    let entries = device.history().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].amount.cents(), 500);
    assert_eq!(entries[1].amount.cents(), -500);
}

#[test]
fn deposit_illegal_sequences_carry_the_illegal_code() {
    let device = test_device();
    let deposit = device.deposit();

    let err = deposit.fix_deposit().unwrap_err();
    assert_eq!(err.code(), codes::E_ILLEGAL);

    deposit.begin_deposit();
    let err = deposit.end_deposit(DepositAction::NoChange).unwrap_err();
    assert_eq!(err.code(), codes::E_ILLEGAL);

    deposit.pause_deposit(PauseRequest::Pause).unwrap();
    let err = deposit.pause_deposit(PauseRequest::Pause).unwrap_err();
    assert_eq!(err.code(), codes::E_ILLEGAL);
}

#[test]
fn bulk_deposit_tracks_every_entry() {
    let device = test_device();
    let deposit = device.deposit();
    deposit.begin_deposit();

    let mut counts = BTreeMap::new();
    counts.insert(bill(100), 3);
    counts.insert(coin(25), 2);
    deposit.track_bulk_deposit(&counts);

    assert_eq!(deposit.amount().cents(), 350);
    assert_eq!(device.inventory().count(&bill(100)), 5 + 3);
    assert_eq!(device.inventory().count(&coin(25)), 5 + 2);
}

// =============================================================================
// Dispense flows
// =============================================================================

#[tokio::test]
async fn dispense_while_jammed_fails_and_moves_nothing() {
    let device = test_device();
    device.hardware().set_jammed(true);
    let total_before = device.inventory().total(None);

    let (cb, rx) = callback();
    let err = device
        .dispense()
        .dispense_change(Money::from_cents(100), None, DispenseMode::Sync, cb)
        .await
        .unwrap_err();

    assert!(matches!(err, DeviceError::Jammed));
    assert_eq!(rx.await.unwrap(), (codes::E_FAILURE, 0));
    assert_eq!(device.inventory().total(None), total_before);
    assert!(device.history().is_empty());
}

#[tokio::test]
async fn over_dispense_holds_error_until_cleared() {
    let device = test_device();

    let (cb, rx) = callback();
    let err = device
        .dispense()
        .dispense_change(Money::from_cents(10_000), None, DispenseMode::Sync, cb)
        .await
        .unwrap_err();

    assert_eq!(err.code(), codes::E_EXTENDED);
    assert_eq!(err.extended_code(), codes::ECHAN_OVERDISPENSE);
    assert_eq!(
        rx.await.unwrap(),
        (codes::E_EXTENDED, codes::ECHAN_OVERDISPENSE)
    );
    assert_eq!(device.dispense().status(), DispenseStatus::Error);

    device.dispense().clear_error();
    assert_eq!(device.dispense().status(), DispenseStatus::Idle);
    // Idempotent once Idle
    device.dispense().clear_error();
    assert_eq!(device.dispense().status(), DispenseStatus::Idle);
}

#[tokio::test]
async fn busy_controller_rejects_concurrent_dispense() {
    let mut config = test_config();
    config.delay = DelayConfig {
        enabled: true,
        min_ms: 80,
        max_ms: 80,
    };
    let device = Arc::new(CashChangerDevice::with_injector(
        config,
        FaultInjector::seeded(17),
    ));

    let (cb1, rx1) = callback();
    device
        .dispense()
        .dispense_change(Money::from_cents(100), None, DispenseMode::Async, cb1)
        .await
        .unwrap();
    assert_eq!(device.dispense().status(), DispenseStatus::Busy);

    let (cb2, rx2) = callback();
    let err = device
        .dispense()
        .dispense_change(Money::from_cents(100), None, DispenseMode::Sync, cb2)
        .await
        .unwrap_err();
    assert!(matches!(err, DeviceError::Busy));
    assert_eq!(rx2.await.unwrap(), (codes::E_BUSY, 0));

    assert_eq!(rx1.await.unwrap(), (codes::SUCCESS, 0));
    assert_eq!(device.dispense().status(), DispenseStatus::Idle);
}

#[tokio::test]
async fn deposit_fault_blocks_completion_until_repay() {
    let mut config = test_config();
    config.deposit_fault = FaultConfig {
        enabled: true,
        rate: 1.0,
    };
    let device = CashChangerDevice::with_injector(config, FaultInjector::seeded(17));
    let deposit = device.deposit();

    deposit.begin_deposit();
    deposit.track_deposit(&bill(500)); // validation fails, overlap raised
    assert!(device.hardware().overlapped());
    assert!(deposit.amount().is_zero());

    deposit.fix_deposit().unwrap();
    let err = deposit.end_deposit(DepositAction::NoChange).unwrap_err();
    assert_eq!(err.code(), codes::E_FAILURE);

    deposit.end_deposit(DepositAction::Repay).unwrap();
    assert!(!device.hardware().overlapped());
}

// =============================================================================
// Status pipeline
// =============================================================================

#[tokio::test]
async fn dispensing_a_slot_dry_drives_both_axes() {
    let device = test_device();
    assert_eq!(device.status().device_status(), CashStatus::Normal);

    // Drain the $5 slot through a real payout
    let mut counts = BTreeMap::new();
    counts.insert(bill(500), 5);
    let (cb, rx) = callback();
    device
        .dispense()
        .dispense_cash(counts, DispenseMode::Sync, cb)
        .await
        .unwrap();
    assert_eq!(rx.await.unwrap(), (codes::SUCCESS, 0));

    assert_eq!(device.status().device_status(), CashStatus::Empty);

    // Stuff the 25¢ slot through deposits: both axes alarm at once
    let deposit = device.deposit();
    deposit.begin_deposit();
    let mut counts = BTreeMap::new();
    counts.insert(coin(25), 10);
    deposit.track_bulk_deposit(&counts);

    assert_eq!(device.status().device_status(), CashStatus::Empty);
    assert_eq!(device.status().full_status(), CashStatus::Full);
}

#[test]
fn history_records_the_whole_story_in_order() {
    let device = test_device();
    let deposit = device.deposit();

    deposit.begin_deposit();
    deposit.track_deposit(&bill(100));
    deposit.track_deposit(&bill(100));
    deposit.fix_deposit().unwrap();
    deposit.end_deposit(DepositAction::NoChange).unwrap();

    let mut refill = BTreeMap::new();
    refill.insert(coin(25), 20);
    device.manager().refill(&refill);

    let entries = device.history().entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].timestamp <= entries[1].timestamp);
    assert_eq!(entries[0].amount.cents(), 200);
    assert_eq!(entries[1].amount.cents(), 500);
}
