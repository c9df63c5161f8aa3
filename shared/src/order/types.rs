//! Order document and status enums

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::util::now_millis;

// ============================================================================
// Payment Status
// ============================================================================

/// Payment status of an order
///
/// Moves only forward: `Pending → {Paid, Failed}`. `Paid` and `Failed` are
/// terminal for a payment attempt; `Refunded` is a valid later successor of
/// `Paid` (external trigger).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Terminal for automatic transitions (refund is an external trigger)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

// ============================================================================
// Order Status
// ============================================================================

/// Fulfillment status of an order
///
/// `Confirmed` is only reachable after `PaymentStatus::Paid`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

// ============================================================================
// Shipment Status
// ============================================================================

/// Carrier-reported shipment status, normalized
///
/// The main line carries a total forward rank so out-of-order webhook
/// deliveries can be rejected. `Rto`, `Lost` and `Damaged` are terminal
/// exception branches reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Created,
    PickupScheduled,
    PickedUp,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    /// Return to origin
    Rto,
    Lost,
    Damaged,
}

impl ShipmentStatus {
    /// Forward rank on the main delivery line
    ///
    /// Exception branches share the maximum rank; ordering between them is
    /// meaningless and they are all terminal.
    pub fn rank(&self) -> u8 {
        match self {
            ShipmentStatus::Created => 0,
            ShipmentStatus::PickupScheduled => 1,
            ShipmentStatus::PickedUp => 2,
            ShipmentStatus::Shipped => 3,
            ShipmentStatus::InTransit => 4,
            ShipmentStatus::OutForDelivery => 5,
            ShipmentStatus::Delivered => 6,
            ShipmentStatus::Rto | ShipmentStatus::Lost | ShipmentStatus::Damaged => 7,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered
                | ShipmentStatus::Rto
                | ShipmentStatus::Lost
                | ShipmentStatus::Damaged
        )
    }

    /// Exception branch (never maps onto the forward order status line)
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Rto | ShipmentStatus::Lost | ShipmentStatus::Damaged
        )
    }

    /// Order status this shipment status advances the order to
    ///
    /// Exception branches return `None`: the order keeps its last forward
    /// value and resolution is an administrative action.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            ShipmentStatus::Created | ShipmentStatus::PickupScheduled | ShipmentStatus::PickedUp => {
                Some(OrderStatus::Processing)
            }
            ShipmentStatus::Shipped
            | ShipmentStatus::InTransit
            | ShipmentStatus::OutForDelivery => Some(OrderStatus::Shipped),
            ShipmentStatus::Delivered => Some(OrderStatus::Delivered),
            ShipmentStatus::Rto | ShipmentStatus::Lost | ShipmentStatus::Damaged => None,
        }
    }
}

// ============================================================================
// Sub-records
// ============================================================================

/// Normalized payment metadata recorded on the paid transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentMeta {
    /// Gateway that captured the payment
    pub provider: String,
    /// Payment method (card, upi, netbanking, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Gateway fee, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    /// Capture timestamp (Unix millis)
    pub captured_at: i64,
}

/// Carrier-side shipment record, populated incrementally as events arrive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShipmentInfo {
    /// Carrier's own order identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_order_id: Option<String>,
    /// Carrier shipment identifier — webhook match key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    /// Air waybill (tracking number), assigned at most once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
    /// Pickup timestamp (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    /// Return-to-origin timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rto_at: Option<i64>,
}

/// Order line item snapshot, immutable for the reconciliation core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Shipping address snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ============================================================================
// Order
// ============================================================================

/// The order document
///
/// Created at checkout as `Pending`/`Pending` and from then on mutated only
/// by verified payment and shipping events. `version` is the optimistic
/// concurrency token: every committed transition increments it, and a
/// transition only commits if the stored version still matches the one the
/// reconciler read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Opaque unique identifier, immutable
    ///
    /// Stored as `order_id` inside document stores whose record ids are
    /// store-owned; the alias lets both shapes deserialize.
    #[serde(alias = "order_id")]
    pub id: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    /// Gateway transaction id, set at most once — the natural idempotency
    /// key for payment events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_txn_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentMeta>,
    /// Recorded on the failed transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment: Option<ShipmentInfo>,
    /// Set at most once, after the first successful paid transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
    /// Transaction id already recorded with the accounting ledger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_txn_id: Option<String>,
    /// Set when the order needs manual review (e.g. amount mismatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    /// Expected total, set at checkout
    pub total: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    /// Optimistic concurrency version, bumped by the store on every commit
    #[serde(default)]
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a new order at checkout (pending/pending)
    pub fn new(
        id: impl Into<String>,
        total: Decimal,
        currency: impl Into<String>,
        items: Vec<OrderItem>,
        shipping_address: Address,
    ) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            payment_txn_id: None,
            payment: None,
            failure_reason: None,
            shipment: None,
            invoice_id: None,
            invoice_url: None,
            ledger_txn_id: None,
            review_reason: None,
            total,
            currency: currency.into(),
            items,
            shipping_address,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`; called before every store write
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Current shipment status, if any event has been applied
    pub fn shipment_status(&self) -> Option<ShipmentStatus> {
        self.shipment.as_ref().and_then(|s| s.status)
    }

    /// Tracking number, if a shipment has been created
    pub fn awb(&self) -> Option<&str> {
        self.shipment.as_ref().and_then(|s| s.awb.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_rank_is_strictly_increasing_on_main_line() {
        let line = [
            ShipmentStatus::Created,
            ShipmentStatus::PickupScheduled,
            ShipmentStatus::PickedUp,
            ShipmentStatus::Shipped,
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
            ShipmentStatus::Delivered,
        ];
        for pair in line.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn exception_branches_are_terminal_and_outrank_the_line() {
        for s in [
            ShipmentStatus::Rto,
            ShipmentStatus::Lost,
            ShipmentStatus::Damaged,
        ] {
            assert!(s.is_terminal());
            assert!(s.is_exception());
            assert!(s.rank() > ShipmentStatus::Delivered.rank());
            assert_eq!(s.order_status(), None);
        }
    }

    #[test]
    fn status_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ShipmentStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
        let json = serde_json::to_string(&PaymentStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
    }
}
