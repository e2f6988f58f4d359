//! Scripted walkthrough of the simulated device: wires a changer from the
//! environment-aware config, runs one deposit session and two dispenses,
//! then dumps the transaction log.
//!
//! ## Usage
//! ```bash
//! cargo run --bin demo
//! RUST_LOG=debug CASHSIM_DELAY_ENABLED=1 cargo run --bin demo
//! ```

use cashsim_core::{DenominationKey, Money};
use cashsim_device::{
    CashChangerDevice, DepositAction, DispenseMode, SimulatorConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SimulatorConfig::from_env();
    let currency = config.currency_code.clone();
    let device = CashChangerDevice::new(config);

    info!(total = %device.inventory().total(None), "initial float loaded");

    // A customer pays $13.65 with a $20 bill
    let twenty = DenominationKey::bill(Money::from_cents(2000), &currency);
    let deposit = device.deposit();
    deposit.begin_deposit();
    deposit.track_deposit(&twenty);
    if let Err(err) = deposit.fix_deposit() {
        info!(%err, "fix failed");
    }
    deposit
        .end_deposit(DepositAction::NoChange)
        .expect("scripted deposit should finalize");
    info!(amount = %deposit.amount(), "deposit session finished");

    // Pay the change back out, synchronously
    device
        .dispense()
        .dispense_change(
            Money::from_cents(635),
            Some(currency.clone()),
            DispenseMode::Sync,
            Box::new(|code, extended| {
                info!(code, extended, "sync dispense completed");
            }),
        )
        .await
        .expect("scripted dispense should succeed");

    // And one asynchronous payout
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    device
        .dispense()
        .dispense_change(
            Money::from_cents(1200),
            Some(currency),
            DispenseMode::Async,
            Box::new(move |code, extended| {
                let _ = done_tx.send((code, extended));
            }),
        )
        .await
        .expect("async dispense should start");
    let (code, extended) = done_rx.await.expect("callback always fires");
    info!(code, extended, "async dispense completed");

    info!(
        total = %device.inventory().total(None),
        device_status = ?device.status().device_status(),
        full_status = ?device.status().full_status(),
        "final state"
    );

    let log = serde_json::to_string_pretty(&device.history().entries())
        .expect("history serializes");
    println!("{log}");
}
