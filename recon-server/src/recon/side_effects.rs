//! Side-effect orchestration
//!
//! Downstream actions fired after a committed paid transition: invoice
//! generation, carrier shipment creation, accounting-ledger sync. Each
//! action runs independently and is idempotent at the data level, so the
//! catch-up sweep can re-run the whole set at any time. A failure is
//! captured in the report and logged; it never rolls back the committed
//! transition and never fails the webhook acknowledgement.

use std::sync::Arc;

use serde::Serialize;

use super::ShipmentReconciler;
use crate::db::OrderStore;
use crate::gateways::{AccountingApi, InvoiceService};

/// Downstream action kind
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SideEffectKind {
    Invoice,
    Shipment,
    Accounting,
}

/// Result of one action
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SideEffectOutcome {
    /// Action performed in this run
    Done,
    /// Already satisfied; nothing to do
    Skipped,
    Failed,
}

/// One collected action result
#[derive(Debug, Clone, Serialize)]
pub struct SideEffectResult {
    pub kind: SideEffectKind,
    pub outcome: SideEffectOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-action results of one orchestration run
#[derive(Debug, Clone, Serialize, Default)]
pub struct SideEffectReport {
    pub results: Vec<SideEffectResult>,
}

impl SideEffectReport {
    /// True if no action failed
    pub fn is_clean(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.outcome != SideEffectOutcome::Failed)
    }

    pub fn outcome_of(&self, kind: SideEffectKind) -> Option<SideEffectOutcome> {
        self.results.iter().find(|r| r.kind == kind).map(|r| r.outcome)
    }

    fn push(&mut self, kind: SideEffectKind, result: Result<SideEffectOutcome, String>) {
        match result {
            Ok(outcome) => self.results.push(SideEffectResult {
                kind,
                outcome,
                error: None,
            }),
            Err(error) => {
                tracing::warn!(kind = ?kind, error = %error, "Side effect failed");
                self.results.push(SideEffectResult {
                    kind,
                    outcome: SideEffectOutcome::Failed,
                    error: Some(error),
                });
            }
        }
    }
}

/// Orchestrates the post-payment side effects
pub struct SideEffectOrchestrator {
    store: Arc<dyn OrderStore>,
    invoicing: Arc<dyn InvoiceService>,
    accounting: Arc<dyn AccountingApi>,
    shipments: Arc<ShipmentReconciler>,
}

impl SideEffectOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        invoicing: Arc<dyn InvoiceService>,
        accounting: Arc<dyn AccountingApi>,
        shipments: Arc<ShipmentReconciler>,
    ) -> Self {
        Self {
            store,
            invoicing,
            accounting,
            shipments,
        }
    }

    /// Run all post-payment actions for an order
    ///
    /// Attempted in a fixed order (invoice first so the ledger sync can
    /// reference it), but never short-circuited: a failure is recorded and
    /// the remaining actions still run. Each action re-reads the order so
    /// sequential compare-and-set writes see fresh versions.
    pub async fn run_post_payment(&self, order_id: &str) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        report.push(SideEffectKind::Invoice, self.ensure_invoice(order_id).await);
        report.push(SideEffectKind::Shipment, self.ensure_shipment(order_id).await);
        report.push(SideEffectKind::Accounting, self.ensure_ledger(order_id).await);

        if !report.is_clean() {
            tracing::warn!(
                order_id = %order_id,
                report = ?report,
                "Side effects incomplete, catch-up sweep will retry"
            );
        }
        report
    }

    /// Generate the invoice once
    async fn ensure_invoice(&self, order_id: &str) -> Result<SideEffectOutcome, String> {
        let order = self
            .store
            .get(order_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("order {} disappeared", order_id))?;

        if order.invoice_id.is_some() {
            return Ok(SideEffectOutcome::Skipped);
        }

        let invoice = self.invoicing.generate(&order).await.map_err(|e| e.to_string())?;
        let mut updated = order;
        updated.invoice_id = Some(invoice.invoice_id.clone());
        updated.invoice_url = invoice.invoice_url;
        updated.touch();
        self.store
            .update_checked(&updated)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(order_id = %order_id, invoice_id = %invoice.invoice_id, "Invoice generated");
        Ok(SideEffectOutcome::Done)
    }

    /// Create the carrier shipment once
    async fn ensure_shipment(&self, order_id: &str) -> Result<SideEffectOutcome, String> {
        let sync = self
            .shipments
            .create_or_sync(order_id)
            .await
            .map_err(|e| e.to_string())?;
        if sync.created {
            Ok(SideEffectOutcome::Done)
        } else {
            Ok(SideEffectOutcome::Skipped)
        }
    }

    /// Record the payment with the accounting ledger once
    ///
    /// Keyed by the gateway transaction id on both sides: the order tracks
    /// the recorded id, and the ledger treats the reference as an
    /// idempotency key.
    async fn ensure_ledger(&self, order_id: &str) -> Result<SideEffectOutcome, String> {
        let order = self
            .store
            .get(order_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("order {} disappeared", order_id))?;

        let Some(txn_id) = order.payment_txn_id.clone() else {
            return Err(format!("order {} is missing its transaction id", order_id));
        };
        if order.ledger_txn_id.as_deref() == Some(txn_id.as_str()) {
            return Ok(SideEffectOutcome::Skipped);
        }

        // Reference the invoice when it exists; the order id otherwise, so a
        // failed invoice never blocks revenue recording.
        let document_ref = order.invoice_id.clone().unwrap_or_else(|| order.id.clone());
        let method = order.payment.as_ref().and_then(|p| p.method.clone());
        self.accounting
            .record_payment(&document_ref, order.total, method.as_deref(), &txn_id)
            .await
            .map_err(|e| e.to_string())?;

        let mut updated = order;
        updated.ledger_txn_id = Some(txn_id.clone());
        updated.touch();
        self.store
            .update_checked(&updated)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(order_id = %order_id, txn_id = %txn_id, "Ledger sync recorded");
        Ok(SideEffectOutcome::Done)
    }
}
