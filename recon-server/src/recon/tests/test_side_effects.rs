//! Side-effect isolation and sweep tests

use std::sync::atomic::Ordering;
use std::time::Duration;

use shared::order::{OrderStatus, PaymentStatus};

use super::*;
use crate::recon::SweepWorker;
use crate::recon::side_effects::{SideEffectKind, SideEffectOutcome};

#[tokio::test]
async fn accounting_failure_does_not_roll_back_or_block_siblings() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.accounting.fail.store(true, Ordering::SeqCst);

    let ack = fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();
    let report = ack.effects.unwrap();
    assert_eq!(
        report.outcome_of(SideEffectKind::Accounting),
        Some(SideEffectOutcome::Failed)
    );
    assert_eq!(
        report.outcome_of(SideEffectKind::Invoice),
        Some(SideEffectOutcome::Done)
    );
    assert_eq!(
        report.outcome_of(SideEffectKind::Shipment),
        Some(SideEffectOutcome::Done)
    );

    // primary transition stands
    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert!(order.invoice_id.is_some());
    assert!(order.awb().is_some());
    assert_eq!(order.ledger_txn_id, None);
}

#[tokio::test]
async fn invoice_failure_still_records_revenue_against_the_order() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.invoicing.fail.store(true, Ordering::SeqCst);

    let ack = fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();
    let report = ack.effects.unwrap();
    assert_eq!(
        report.outcome_of(SideEffectKind::Invoice),
        Some(SideEffectOutcome::Failed)
    );
    assert_eq!(
        report.outcome_of(SideEffectKind::Accounting),
        Some(SideEffectOutcome::Done)
    );

    // ledger entry references the order id when no invoice exists
    let recorded = fx.accounting.recorded.lock().unwrap().clone();
    assert_eq!(recorded, vec![("O1".to_string(), "T1".to_string())]);
}

#[tokio::test]
async fn rerunning_the_orchestrator_is_idempotent() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();

    let report = fx.effects.run_post_payment("O1").await;
    for kind in [
        SideEffectKind::Invoice,
        SideEffectKind::Shipment,
        SideEffectKind::Accounting,
    ] {
        assert_eq!(report.outcome_of(kind), Some(SideEffectOutcome::Skipped));
    }
    assert_eq!(fx.invoicing.generated(), 1);
    assert_eq!(fx.carrier.created(), 1);
    assert_eq!(fx.accounting.recorded_count(), 1);
}

#[tokio::test]
async fn sweep_repairs_a_previously_failed_side_effect() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;

    // carrier is down when the payment lands
    fx.carrier.fail_create.store(true, Ordering::SeqCst);
    let ack = fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();
    assert!(!ack.effects.unwrap().is_clean());

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.awb(), None);

    // the order is visible to the catch-up listing
    let missing = fx.store.list_missing_shipment().await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id, "O1");

    // carrier recovers; one sweep pass repairs the order
    fx.carrier.fail_create.store(false, Ordering::SeqCst);
    let worker = SweepWorker::new(
        fx.store.clone(),
        fx.effects.clone(),
        Duration::from_secs(300),
    );
    let touched = worker.run_once().await;
    assert_eq!(touched, 1);

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.awb(), Some("AWB-O1"));
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(fx.store.list_missing_shipment().await.unwrap().is_empty());
}

#[tokio::test]
async fn sweep_with_nothing_pending_is_quiet() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();

    let worker = SweepWorker::new(
        fx.store.clone(),
        fx.effects.clone(),
        Duration::from_secs(300),
    );
    assert_eq!(worker.run_once().await, 0);
    assert_eq!(fx.invoicing.generated(), 1);
    assert_eq!(fx.carrier.created(), 1);
}

#[tokio::test]
async fn ledger_sync_is_keyed_by_transaction_id() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();

    // even a direct re-run cannot double-record the same transaction
    fx.effects.run_post_payment("O1").await;
    fx.effects.run_post_payment("O1").await;
    assert_eq!(fx.accounting.recorded_count(), 1);

    let recorded = fx.accounting.recorded.lock().unwrap().clone();
    assert_eq!(recorded[0].1, "T1");
}

#[tokio::test]
async fn report_serializes_for_observability() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;
    fx.accounting.fail.store(true, Ordering::SeqCst);

    let ack = fx.payments.apply(&captured("T1", "O1", total_999())).await.unwrap();
    let json = serde_json::to_value(ack.effects.unwrap()).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[2]["kind"], "ACCOUNTING");
    assert_eq!(results[2]["outcome"], "FAILED");
    assert!(results[2]["error"].is_string());
}
