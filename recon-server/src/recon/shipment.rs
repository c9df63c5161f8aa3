//! Shipment reconciliation
//!
//! Drives `order.status` and the `shipment` sub-record from verified
//! carrier events, and owns the idempotent manual shipment trigger.

use std::sync::Arc;

use shared::order::{Order, PaymentStatus, ShipmentEvent, ShipmentInfo, ShipmentStatus};
use shared::util::now_millis;

use super::idempotency::{ShipmentDisposition, shipment_disposition};
use super::{ReconError, ReconOutcome, ShipmentAck, ShipmentSync};
use crate::db::OrderStore;
use crate::gateways::ShippingCarrier;

/// Map a carrier status phrase onto the internal status enum
///
/// Carriers report free-form phrases ("Out For Delivery", "RTO Initiated",
/// "In Transit - EN ROUTE"); matching is lowercase keyword containment.
/// Exception branches are checked first: "RTO Delivered" must map to RTO,
/// not Delivered. Unknown phrases return `None` and are acknowledged
/// without mutation.
pub fn map_carrier_status(raw: &str) -> Option<ShipmentStatus> {
    let s = raw.to_ascii_lowercase();
    if s.contains("rto") || s.contains("return") {
        Some(ShipmentStatus::Rto)
    } else if s.contains("lost") {
        Some(ShipmentStatus::Lost)
    } else if s.contains("damaged") {
        Some(ShipmentStatus::Damaged)
    } else if s.contains("out for delivery") {
        Some(ShipmentStatus::OutForDelivery)
    } else if s.contains("delivered") {
        Some(ShipmentStatus::Delivered)
    } else if s.contains("in transit") || s.contains("in-transit") {
        Some(ShipmentStatus::InTransit)
    } else if s.contains("shipped") || s.contains("dispatched") {
        Some(ShipmentStatus::Shipped)
    } else if s.contains("picked") || s.contains("pickup complete") {
        Some(ShipmentStatus::PickedUp)
    } else if s.contains("pickup scheduled") || s.contains("pickup generated") {
        Some(ShipmentStatus::PickupScheduled)
    } else if s.contains("manifest") || s.contains("created") || s == "new" {
        Some(ShipmentStatus::Created)
    } else {
        None
    }
}

/// Shipment state machine
pub struct ShipmentReconciler {
    store: Arc<dyn OrderStore>,
    carrier: Arc<dyn ShippingCarrier>,
}

impl ShipmentReconciler {
    pub fn new(store: Arc<dyn OrderStore>, carrier: Arc<dyn ShippingCarrier>) -> Self {
        Self { store, carrier }
    }

    /// Apply a verified carrier event
    ///
    /// The order is matched via the carrier-assigned identifier, never the
    /// merchant order id alone. Stale and unknown statuses acknowledge
    /// without mutation so the carrier stops redelivering.
    pub async fn apply(&self, event: &ShipmentEvent) -> Result<ShipmentAck, ReconError> {
        let key = event.match_key().ok_or_else(|| {
            ReconError::InvalidEvent("shipment event carries no carrier identifier".to_string())
        })?;

        let order = self.store.find_by_shipment(key).await?.ok_or_else(|| {
            // may indicate a race with shipment creation or a misconfigured
            // carrier account; worth investigating either way
            tracing::warn!(key = %key, status_raw = %event.status_raw, "Carrier event matched no order");
            ReconError::OrderNotFound(format!("no order for shipment {}", key))
        })?;

        let Some(incoming) = map_carrier_status(&event.status_raw) else {
            tracing::warn!(
                order_id = %order.id,
                status_raw = %event.status_raw,
                "Unknown carrier status phrase, acknowledged without mutation"
            );
            return Ok(ShipmentAck {
                order_id: order.id,
                outcome: ReconOutcome::Ignored,
                status: None,
            });
        };

        match shipment_disposition(order.shipment_status(), incoming) {
            ShipmentDisposition::Stale => {
                tracing::info!(
                    order_id = %order.id,
                    current = ?order.shipment_status(),
                    incoming = ?incoming,
                    "Stale shipment event, acknowledged without mutation"
                );
                Ok(ShipmentAck {
                    status: order.shipment_status(),
                    order_id: order.id,
                    outcome: ReconOutcome::Ignored,
                })
            }
            ShipmentDisposition::Apply => {
                let mut updated = order.clone();
                apply_event_fields(&mut updated, event, incoming);
                updated.touch();
                let committed = self.store.update_checked(&updated).await?;

                tracing::info!(
                    order_id = %committed.id,
                    status = ?incoming,
                    order_status = ?committed.status,
                    "Shipment event applied"
                );
                Ok(ShipmentAck {
                    order_id: committed.id,
                    outcome: ReconOutcome::Applied,
                    status: Some(incoming),
                })
            }
        }
    }

    /// Create the carrier shipment for an order, or report the existing one
    ///
    /// Idempotent: an order that already has a tracking number
    /// short-circuits with the stored data (never a second carrier order)
    /// and refreshes its status from the carrier's tracking feed. Creation
    /// requires the order to be paid.
    pub async fn create_or_sync(&self, order_id: &str) -> Result<ShipmentSync, ReconError> {
        let order = self
            .store
            .get(order_id)
            .await?
            .ok_or_else(|| ReconError::OrderNotFound(order_id.to_string()))?;

        if let Some(awb) = order.awb().map(str::to_string) {
            let status = self.refresh_from_tracking(&order, &awb).await;
            return Ok(ShipmentSync {
                order_id: order.id,
                created: false,
                awb: Some(awb),
                status,
            });
        }

        if order.payment_status != PaymentStatus::Paid {
            return Err(ReconError::NotPaid(order.id));
        }

        let assigned = self.carrier.create_shipment(&order).await?;
        let mut updated = order.clone();
        let shipment = updated.shipment.get_or_insert_with(ShipmentInfo::default);
        shipment.carrier_order_id = Some(assigned.carrier_order_id);
        shipment.shipment_id = Some(assigned.shipment_id);
        shipment.awb = Some(assigned.awb.clone());
        shipment.courier_name = assigned.courier_name;
        shipment.label_url = assigned.label_url;
        shipment.status = Some(ShipmentStatus::Created);
        if let Some(next) = ShipmentStatus::Created.order_status() {
            updated.status = next;
        }
        updated.touch();
        let committed = self.store.update_checked(&updated).await?;

        tracing::info!(order_id = %committed.id, awb = %assigned.awb, "Carrier shipment created");
        Ok(ShipmentSync {
            order_id: committed.id,
            created: true,
            awb: Some(assigned.awb),
            status: Some(ShipmentStatus::Created),
        })
    }

    /// Best-effort status refresh from the tracking feed
    ///
    /// Failures are logged and swallowed: the sync call still reports the
    /// stored tracking data.
    async fn refresh_from_tracking(&self, order: &Order, awb: &str) -> Option<ShipmentStatus> {
        let scans = match self.carrier.fetch_tracking(awb).await {
            Ok(scans) => scans,
            Err(e) => {
                tracing::warn!(order_id = %order.id, awb = %awb, error = %e, "Tracking refresh failed");
                return order.shipment_status();
            }
        };

        let latest = scans
            .iter()
            .filter_map(|s| map_carrier_status(&s.status_raw))
            .max_by_key(|s| s.rank());
        let Some(latest) = latest else {
            return order.shipment_status();
        };

        if shipment_disposition(order.shipment_status(), latest) == ShipmentDisposition::Apply {
            let mut updated = order.clone();
            if let Some(shipment) = updated.shipment.as_mut() {
                shipment.status = Some(latest);
            }
            if let Some(next) = latest.order_status() {
                updated.status = next;
            }
            updated.touch();
            if let Err(e) = self.store.update_checked(&updated).await {
                tracing::warn!(order_id = %order.id, error = %e, "Tracking refresh write failed");
                return order.shipment_status();
            }
            return Some(latest);
        }
        order.shipment_status()
    }
}

/// Merge the event's fields into the order record
///
/// Identifiers and timestamps fill in incrementally; the tracking number
/// is assigned at most once and a conflicting value is ignored.
fn apply_event_fields(order: &mut Order, event: &ShipmentEvent, incoming: ShipmentStatus) {
    let shipment = order.shipment.get_or_insert_with(ShipmentInfo::default);

    shipment.status = Some(incoming);
    if shipment.shipment_id.is_none() {
        shipment.shipment_id = event.shipment_id.clone();
    }
    if shipment.carrier_order_id.is_none() {
        shipment.carrier_order_id = event.carrier_order_id.clone();
    }
    match (&shipment.awb, &event.awb) {
        (None, Some(awb)) => shipment.awb = Some(awb.clone()),
        (Some(stored), Some(incoming_awb)) if stored != incoming_awb => {
            tracing::warn!(
                order_id = %order.id,
                stored = %stored,
                incoming = %incoming_awb,
                "Event carries a different tracking number, keeping the stored one"
            );
        }
        _ => {}
    }
    if shipment.courier_name.is_none() {
        shipment.courier_name = event.courier_name.clone();
    }
    if let Some(d) = event.pickup_date {
        shipment.pickup_at = Some(d);
    }
    if let Some(d) = event.shipped_date {
        shipment.shipped_at = Some(d);
    }
    match incoming {
        ShipmentStatus::Delivered => {
            shipment.delivered_at = event.delivered_date.or(Some(now_millis()));
        }
        ShipmentStatus::Rto => {
            shipment.rto_at = event.rto_date.or(Some(now_millis()));
        }
        _ => {}
    }

    if let Some(next) = incoming.order_status() {
        order.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_vocabulary_maps_to_internal_statuses() {
        let cases = [
            ("Delivered", ShipmentStatus::Delivered),
            ("DELIVERED TO CONSIGNEE", ShipmentStatus::Delivered),
            ("Out For Delivery", ShipmentStatus::OutForDelivery),
            ("In Transit - EN ROUTE", ShipmentStatus::InTransit),
            ("Shipped", ShipmentStatus::Shipped),
            ("Picked Up", ShipmentStatus::PickedUp),
            ("Pickup Scheduled", ShipmentStatus::PickupScheduled),
            ("Manifest Generated", ShipmentStatus::Created),
            ("RTO Initiated", ShipmentStatus::Rto),
            // exception wins over the embedded "delivered"
            ("RTO Delivered", ShipmentStatus::Rto),
            ("Shipment Lost", ShipmentStatus::Lost),
            ("Damaged in transit", ShipmentStatus::Damaged),
        ];
        for (raw, expected) in cases {
            assert_eq!(map_carrier_status(raw), Some(expected), "{}", raw);
        }
    }

    #[test]
    fn unknown_phrases_map_to_none() {
        assert_eq!(map_carrier_status("Quantum Tunnelled"), None);
        assert_eq!(map_carrier_status(""), None);
    }
}
