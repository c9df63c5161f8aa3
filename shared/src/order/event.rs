//! Provider event records
//!
//! Inbound callbacks are decoded into these tagged records at the HTTP
//! boundary, after signature verification. Internal logic never operates on
//! raw provider payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Payment Events
// ============================================================================

/// A verified payment-gateway event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentEvent {
    Captured(PaymentCaptured),
    Failed(PaymentFailed),
}

impl PaymentEvent {
    pub fn txn_id(&self) -> &str {
        match self {
            PaymentEvent::Captured(e) => &e.txn_id,
            PaymentEvent::Failed(e) => &e.txn_id,
        }
    }

    pub fn order_ref(&self) -> &str {
        match self {
            PaymentEvent::Captured(e) => &e.order_ref,
            PaymentEvent::Failed(e) => &e.order_ref,
        }
    }
}

/// A captured (successful) payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCaptured {
    /// Gateway that delivered the event
    pub provider: String,
    /// Gateway transaction id — the idempotency key
    pub txn_id: String,
    /// Merchant reference mapping back to the internal order id
    pub order_ref: String,
    /// Amount the gateway reports as captured
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    /// Capture timestamp (Unix millis)
    pub occurred_at: i64,
}

/// A failed payment attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentFailed {
    pub provider: String,
    pub txn_id: String,
    pub order_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub occurred_at: i64,
}

// ============================================================================
// Shipment Events
// ============================================================================

/// A verified shipping-carrier status event
///
/// The carrier is the initiator of the callback: matching is done on the
/// carrier-assigned identifiers, not the merchant order id. `status_raw`
/// carries the carrier's own vocabulary; normalization happens in the
/// reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentEvent {
    /// Carrier shipment identifier — primary match key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    /// Carrier order identifier — fallback match key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
    /// Carrier status phrase, e.g. "Out For Delivery"
    pub status_raw: String,
    /// Pickup timestamp (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rto_date: Option<i64>,
}

impl ShipmentEvent {
    /// The identifier used to locate the order (shipment id first)
    pub fn match_key(&self) -> Option<&str> {
        self.shipment_id
            .as_deref()
            .or(self.carrier_order_id.as_deref())
    }
}
