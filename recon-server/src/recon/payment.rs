//! Payment reconciliation
//!
//! The state machine over `payment_status`, driven by verified gateway
//! events. The transition commits through the store's compare-and-set
//! before any side effect runs; side effects can fail without touching the
//! committed state.

use std::sync::Arc;

use shared::order::{
    Order, OrderStatus, PaymentCaptured, PaymentEvent, PaymentFailed, PaymentMeta, PaymentStatus,
};
use shared::util::now_millis;

use super::idempotency::{PaymentDisposition, PaymentOutcome, payment_disposition};
use super::{PaymentAck, ReconError, ReconOutcome, SideEffectOrchestrator};
use crate::db::OrderStore;
use crate::gateways::PaymentGateway;

/// Payment state machine
pub struct PaymentReconciler {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    effects: Arc<SideEffectOrchestrator>,
}

impl PaymentReconciler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        effects: Arc<SideEffectOrchestrator>,
    ) -> Self {
        Self {
            store,
            gateway,
            effects,
        }
    }

    /// Apply a verified payment event
    pub async fn apply(&self, event: &PaymentEvent) -> Result<PaymentAck, ReconError> {
        let order = self
            .store
            .get(event.order_ref())
            .await?
            .ok_or_else(|| ReconError::OrderNotFound(event.order_ref().to_string()))?;

        match event {
            PaymentEvent::Captured(captured) => self.apply_captured(order, captured).await,
            PaymentEvent::Failed(failed) => self.apply_failed(order, failed).await,
        }
    }

    /// `Pending → Paid` (+ `status = Confirmed`), then side effects
    async fn apply_captured(
        &self,
        order: Order,
        event: &PaymentCaptured,
    ) -> Result<PaymentAck, ReconError> {
        match payment_disposition(&order, &event.txn_id, PaymentOutcome::Captured) {
            PaymentDisposition::Replay => {
                tracing::info!(order_id = %order.id, txn_id = %event.txn_id, "Duplicate capture event, acknowledged");
                return Ok(PaymentAck {
                    order_id: order.id,
                    outcome: ReconOutcome::Replayed,
                    effects: None,
                });
            }
            PaymentDisposition::Superseded => {
                tracing::warn!(
                    order_id = %order.id,
                    txn_id = %event.txn_id,
                    applied_txn = ?order.payment_txn_id,
                    payment_status = ?order.payment_status,
                    "Capture event conflicts with terminal payment state, ignored"
                );
                return Ok(PaymentAck {
                    order_id: order.id,
                    outcome: ReconOutcome::Ignored,
                    effects: None,
                });
            }
            PaymentDisposition::Apply => {}
        }

        // Amount check guards against tampering and wrong-order association
        if event.amount != order.total || event.currency != order.currency {
            self.flag_for_review(&order, event).await;
            return Err(ReconError::AmountMismatch {
                order_id: order.id,
                expected: order.total,
                currency: order.currency,
                got: event.amount,
                got_currency: event.currency.clone(),
            });
        }

        let mut updated = order.clone();
        updated.payment_status = PaymentStatus::Paid;
        updated.status = OrderStatus::Confirmed;
        updated.payment_txn_id = Some(event.txn_id.clone());
        updated.payment = Some(PaymentMeta {
            provider: event.provider.clone(),
            method: event.method.clone(),
            fee: event.fee,
            captured_at: event.occurred_at,
        });
        updated.touch();
        let committed = self.store.update_checked(&updated).await?;
        tracing::info!(
            order_id = %committed.id,
            txn_id = %event.txn_id,
            provider = %event.provider,
            "Payment captured, order confirmed"
        );

        // Strictly after the commit; failures are collected, not raised
        let report = self.effects.run_post_payment(&committed.id).await;
        Ok(PaymentAck {
            order_id: committed.id,
            outcome: ReconOutcome::Applied,
            effects: Some(report),
        })
    }

    /// `Pending → Failed` (+ `status = Cancelled`); no side effects
    async fn apply_failed(
        &self,
        order: Order,
        event: &PaymentFailed,
    ) -> Result<PaymentAck, ReconError> {
        match payment_disposition(&order, &event.txn_id, PaymentOutcome::Failed) {
            PaymentDisposition::Replay => {
                return Ok(PaymentAck {
                    order_id: order.id,
                    outcome: ReconOutcome::Replayed,
                    effects: None,
                });
            }
            PaymentDisposition::Superseded => {
                tracing::warn!(
                    order_id = %order.id,
                    txn_id = %event.txn_id,
                    payment_status = ?order.payment_status,
                    "Failure event conflicts with terminal payment state, ignored"
                );
                return Ok(PaymentAck {
                    order_id: order.id,
                    outcome: ReconOutcome::Ignored,
                    effects: None,
                });
            }
            PaymentDisposition::Apply => {}
        }

        let mut updated = order.clone();
        updated.payment_status = PaymentStatus::Failed;
        updated.status = OrderStatus::Cancelled;
        updated.payment_txn_id = Some(event.txn_id.clone());
        updated.failure_reason = event.reason.clone();
        updated.touch();
        let committed = self.store.update_checked(&updated).await?;
        tracing::info!(
            order_id = %committed.id,
            txn_id = %event.txn_id,
            reason = ?event.reason,
            "Payment failed, order cancelled"
        );
        Ok(PaymentAck {
            order_id: committed.id,
            outcome: ReconOutcome::Applied,
            effects: None,
        })
    }

    /// Client-initiated confirmation path
    ///
    /// The handshake signature is verified by the HTTP layer before this is
    /// called. The reported payment is fetched from the gateway — the
    /// client's word is never trusted for amounts — and then goes through
    /// the same captured path as the webhook, with the same amount and
    /// idempotency checks.
    pub async fn finalize_client_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        provider: &str,
    ) -> Result<PaymentAck, ReconError> {
        let fetched = self.gateway.fetch_payment(payment_id).await?;
        if !fetched.is_captured() {
            return Err(ReconError::NotCaptured {
                payment_id: payment_id.to_string(),
                status: fetched.status,
            });
        }

        let event = PaymentCaptured {
            provider: provider.to_string(),
            txn_id: fetched.txn_id,
            order_ref: order_id.to_string(),
            amount: fetched.amount,
            currency: fetched.currency,
            method: fetched.method,
            fee: fetched.fee,
            occurred_at: now_millis(),
        };
        self.apply(&PaymentEvent::Captured(event)).await
    }

    /// Flag the order for manual review after an amount mismatch
    ///
    /// Best-effort: the mismatch error is returned to the caller whether or
    /// not the flag write goes through.
    async fn flag_for_review(&self, order: &Order, event: &PaymentCaptured) {
        let mut flagged = order.clone();
        flagged.review_reason = Some(format!(
            "amount mismatch: expected {} {}, event {} carried {} {}",
            order.total, order.currency, event.txn_id, event.amount, event.currency
        ));
        flagged.touch();
        if let Err(e) = self.store.update_checked(&flagged).await {
            tracing::error!(order_id = %order.id, error = %e, "Failed to flag order for review");
        } else {
            tracing::warn!(
                order_id = %order.id,
                txn_id = %event.txn_id,
                expected = %order.total,
                got = %event.amount,
                "Amount mismatch, order flagged for manual review"
            );
        }
    }
}
