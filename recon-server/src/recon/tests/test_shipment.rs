//! Shipment reconciliation tests

use shared::order::{OrderStatus, PaymentStatus, ShipmentStatus};

use super::*;
use crate::recon::{ReconError, ReconOutcome};

/// Pay the order so a shipment exists (S-<id> / AWB-<id> via the mock)
async fn paid_order_with_shipment(fx: &Fixture, id: &str) {
    seed_order(fx, id, total_999()).await;
    let ack = fx.payments.apply(&captured("T1", id, total_999())).await.unwrap();
    assert_eq!(ack.outcome, ReconOutcome::Applied);
}

#[tokio::test]
async fn carrier_events_advance_the_order() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    let ack = fx.shipments.apply(&shipment_event("S-O1", "Shipped")).await.unwrap();
    assert_eq!(ack.outcome, ReconOutcome::Applied);
    assert_eq!(ack.status, Some(ShipmentStatus::Shipped));

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(order.shipment_status(), Some(ShipmentStatus::Shipped));

    fx.shipments.apply(&shipment_event("S-O1", "Delivered")).await.unwrap();
    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.shipment.unwrap().delivered_at.is_some());
}

#[tokio::test]
async fn out_of_order_events_never_regress() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    // network reordering/redelivery: [shipped, picked, shipped]
    fx.shipments.apply(&shipment_event("S-O1", "Shipped")).await.unwrap();
    let stale = fx.shipments.apply(&shipment_event("S-O1", "Picked Up")).await.unwrap();
    assert_eq!(stale.outcome, ReconOutcome::Ignored);
    let replay = fx.shipments.apply(&shipment_event("S-O1", "Shipped")).await.unwrap();
    assert_eq!(replay.outcome, ReconOutcome::Ignored);

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert!(order.shipment_status().unwrap().rank() >= ShipmentStatus::Shipped.rank());
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn rto_applies_from_a_live_state_but_order_status_keeps_its_line() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    fx.shipments.apply(&shipment_event("S-O1", "Out For Delivery")).await.unwrap();
    let ack = fx.shipments.apply(&shipment_event("S-O1", "RTO Initiated")).await.unwrap();
    assert_eq!(ack.outcome, ReconOutcome::Applied);

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.shipment_status(), Some(ShipmentStatus::Rto));
    assert!(order.shipment.as_ref().unwrap().rto_at.is_some());
    // forward line untouched: resolution is an administrative action
    assert_eq!(order.status, OrderStatus::Shipped);

    // terminal: a late "Delivered" scan cannot move it
    let late = fx.shipments.apply(&shipment_event("S-O1", "Delivered")).await.unwrap();
    assert_eq!(late.outcome, ReconOutcome::Ignored);
}

#[tokio::test]
async fn unknown_status_phrase_acks_without_mutation() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;
    let before = fx.store.get("O1").await.unwrap().unwrap();

    let ack = fx
        .shipments
        .apply(&shipment_event("S-O1", "Vortex Recalibration"))
        .await
        .unwrap();
    assert_eq!(ack.outcome, ReconOutcome::Ignored);

    let after = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn unmatched_shipment_reports_not_found() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    let err = fx.shipments.apply(&shipment_event("S-OTHER", "Shipped")).await.unwrap_err();
    assert!(matches!(err, ReconError::OrderNotFound(_)));

    let err = fx
        .shipments
        .apply(&ShipmentEvent {
            shipment_id: None,
            carrier_order_id: None,
            awb: None,
            courier_name: None,
            status_raw: "Shipped".to_string(),
            pickup_date: None,
            shipped_date: None,
            delivered_date: None,
            rto_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::InvalidEvent(_)));
}

#[tokio::test]
async fn events_match_by_carrier_order_id_as_fallback() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    let event = ShipmentEvent {
        shipment_id: None,
        carrier_order_id: Some("CO-O1".to_string()),
        awb: None,
        courier_name: None,
        status_raw: "In Transit".to_string(),
        pickup_date: None,
        shipped_date: None,
        delivered_date: None,
        rto_date: None,
    };
    let ack = fx.shipments.apply(&event).await.unwrap();
    assert_eq!(ack.outcome, ReconOutcome::Applied);
    assert_eq!(ack.status, Some(ShipmentStatus::InTransit));
}

#[tokio::test]
async fn manual_creation_short_circuits_on_existing_awb() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;
    assert_eq!(fx.carrier.created(), 1);

    let sync = fx.shipments.create_or_sync("O1").await.unwrap();
    assert!(!sync.created);
    assert_eq!(sync.awb.as_deref(), Some("AWB-O1"));
    // no second carrier order
    assert_eq!(fx.carrier.created(), 1);
}

#[tokio::test]
async fn manual_sync_refreshes_status_from_tracking() {
    let fx = fixture();
    paid_order_with_shipment(&fx, "O1").await;

    fx.carrier.set_tracking(&["Picked Up", "In Transit"]);
    let sync = fx.shipments.create_or_sync("O1").await.unwrap();
    assert!(!sync.created);
    assert_eq!(sync.status, Some(ShipmentStatus::InTransit));

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.shipment_status(), Some(ShipmentStatus::InTransit));

    // a stale feed cannot regress the applied status
    fx.shipments.apply(&shipment_event("S-O1", "Delivered")).await.unwrap();
    fx.carrier.set_tracking(&["Picked Up"]);
    let sync = fx.shipments.create_or_sync("O1").await.unwrap();
    assert_eq!(sync.status, Some(ShipmentStatus::Delivered));
}

#[tokio::test]
async fn creation_requires_a_paid_order() {
    let fx = fixture();
    seed_order(&fx, "O1", total_999()).await;

    let err = fx.shipments.create_or_sync("O1").await.unwrap_err();
    assert!(matches!(err, ReconError::NotPaid(_)));
    assert_eq!(fx.carrier.created(), 0);

    let order = fx.store.get("O1").await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.shipment.is_none());
}
