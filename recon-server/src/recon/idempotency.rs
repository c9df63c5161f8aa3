//! Event idempotency and ordering rules
//!
//! Dedup state lives on the order record itself, in the shared store —
//! never in per-process memory — so redeliveries are absorbed identically
//! on every instance. These functions are pure: they compute a disposition
//! from the stored record and the incoming event, and the caller commits
//! (or not) through the store's compare-and-set.
//!
//! Fail-closed: if the record cannot be read, no disposition is computed
//! and the store error propagates as a server error, leaving the provider
//! to redeliver.

use shared::order::{Order, PaymentStatus, ShipmentStatus};

/// Outcome class of a payment event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Captured,
    Failed,
}

/// What to do with a payment event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDisposition {
    /// Not yet applied; run the transition
    Apply,
    /// Exact redelivery of the applied event; acknowledge, no mutation
    Replay,
    /// Conflicts with an already-terminal state; ignore (first outcome wins)
    Superseded,
}

/// Decide how a payment event relates to the order's applied state
///
/// `payment_txn_id` is the natural idempotency key: a terminal order only
/// replays the event that made it terminal. A different transaction id —
/// or the same id with a different outcome — can never change a terminal
/// state.
pub fn payment_disposition(
    order: &Order,
    txn_id: &str,
    outcome: PaymentOutcome,
) -> PaymentDisposition {
    let same_txn = order.payment_txn_id.as_deref() == Some(txn_id);
    match order.payment_status {
        PaymentStatus::Pending => PaymentDisposition::Apply,
        PaymentStatus::Paid if same_txn && outcome == PaymentOutcome::Captured => {
            PaymentDisposition::Replay
        }
        PaymentStatus::Failed if same_txn && outcome == PaymentOutcome::Failed => {
            PaymentDisposition::Replay
        }
        // Refunded, or any outcome-changing / second-payment attempt
        _ => PaymentDisposition::Superseded,
    }
}

/// What to do with a shipment status event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentDisposition {
    Apply,
    /// Not strictly newer than the applied status; acknowledge, no mutation
    Stale,
}

/// Decide whether an incoming shipment status may be applied
///
/// Tolerates out-of-order webhook delivery: only a strictly newer rank
/// advances the record. Terminal states admit nothing after them;
/// exception branches (RTO/lost/damaged) apply from any non-terminal
/// state.
pub fn shipment_disposition(
    current: Option<ShipmentStatus>,
    incoming: ShipmentStatus,
) -> ShipmentDisposition {
    let Some(current) = current else {
        return ShipmentDisposition::Apply;
    };
    if current.is_terminal() {
        return ShipmentDisposition::Stale;
    }
    if incoming.is_exception() || incoming.rank() > current.rank() {
        ShipmentDisposition::Apply
    } else {
        ShipmentDisposition::Stale
    }
}
