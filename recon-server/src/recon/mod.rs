//! Order reconciliation core
//!
//! Takes verified payment-gateway and shipping-carrier events and
//! transitions order state exactly once, regardless of delivery order,
//! retries, or partial failures.
//!
//! # Control Flow
//!
//! ```text
//! inbound callback
//!     → signature verification (raw body, before any lookup)
//!     → decode into a typed provider event
//!     → idempotency/ordering disposition (from the stored record)
//!     → compare-and-set transition (OrderStore)
//!     → side effects (best-effort, isolated, after commit)
//! ```
//!
//! - **signature**: provider MAC schemes, constant-time comparison
//! - **idempotency**: dedup keys and status ordering
//! - **payment**: the payment state machine
//! - **shipment**: the shipment state machine and carrier status mapping
//! - **side_effects**: invoice/shipment/ledger orchestration
//! - **sweep**: periodic catch-up repair of failed side effects

pub mod idempotency;
pub mod payment;
pub mod shipment;
pub mod side_effects;
pub mod signature;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use payment::PaymentReconciler;
pub use shipment::ShipmentReconciler;
pub use side_effects::{SideEffectOrchestrator, SideEffectReport};
pub use sweep::SweepWorker;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::order::ShipmentStatus;
use thiserror::Error;

use crate::db::StoreError;
use crate::gateways::GatewayError;
use crate::utils::AppError;

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Amount mismatch for order {order_id}: expected {expected} {currency}, event carries {got} {got_currency}")]
    AmountMismatch {
        order_id: String,
        expected: Decimal,
        currency: String,
        got: Decimal,
        got_currency: String,
    },

    #[error("Order {0} is not paid")]
    NotPaid(String),

    #[error("Payment {payment_id} is not captured (gateway status: {status})")]
    NotCaptured { payment_id: String, status: String },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<ReconError> for AppError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::OrderNotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            ReconError::AmountMismatch { .. } => AppError::AmountMismatch(err.to_string()),
            ReconError::NotPaid(_) | ReconError::NotCaptured { .. } | ReconError::InvalidEvent(_) => {
                AppError::Validation(err.to_string())
            }
            ReconError::Store(StoreError::VersionConflict(msg)) => AppError::Conflict(msg),
            ReconError::Store(e) => AppError::Store(e.to_string()),
            ReconError::Gateway(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// How an event related to the applied state
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconOutcome {
    /// The event transitioned the order
    Applied,
    /// Exact redelivery of an applied event; no mutation
    Replayed,
    /// Stale or superseded; acknowledged without mutation
    Ignored,
}

/// Acknowledgement for a payment event
#[derive(Debug, Serialize)]
pub struct PaymentAck {
    pub order_id: String,
    pub outcome: ReconOutcome,
    /// Per-action side-effect results; present only when the transition
    /// was applied and side effects ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<SideEffectReport>,
}

/// Acknowledgement for a shipment event
#[derive(Debug, Serialize)]
pub struct ShipmentAck {
    pub order_id: String,
    pub outcome: ReconOutcome,
    /// Normalized status after the event, if applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
}

/// Result of the idempotent manual shipment trigger
#[derive(Debug, Serialize)]
pub struct ShipmentSync {
    pub order_id: String,
    /// True if this call registered the shipment with the carrier
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
}
