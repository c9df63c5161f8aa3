//! Catch-up sweep worker
//!
//! Side-effect failures never fail the webhook acknowledgement, so they
//! must be repaired out of band. This worker periodically lists paid
//! orders missing an invoice or a tracking number and re-runs the
//! orchestrator for them; every action is idempotent, so sweeping an
//! already-healthy order is a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SideEffectOrchestrator;
use crate::db::OrderStore;

/// Periodic repair worker for incomplete side effects
pub struct SweepWorker {
    store: Arc<dyn OrderStore>,
    effects: Arc<SideEffectOrchestrator>,
    interval: Duration,
}

impl SweepWorker {
    pub fn new(
        store: Arc<dyn OrderStore>,
        effects: Arc<SideEffectOrchestrator>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            effects,
            interval,
        }
    }

    /// Spawn the worker; runs until the token is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = self.interval.as_secs(), "Sweep worker started");
            let mut ticker = tokio::time::interval(self.interval);
            // the first tick fires immediately; skip it so startup stays quiet
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Sweep worker received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }
        })
    }

    /// One sweep pass; returns the number of orders touched
    pub async fn run_once(&self) -> usize {
        let mut pending = match self.store.list_missing_invoice().await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Sweep could not list orders missing invoices");
                return 0;
            }
        };
        match self.store.list_missing_shipment().await {
            Ok(orders) => {
                for order in orders {
                    if !pending.iter().any(|o| o.id == order.id) {
                        pending.push(order);
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Sweep could not list orders missing shipments");
            }
        }

        if pending.is_empty() {
            return 0;
        }

        tracing::info!(count = pending.len(), "Sweep repairing incomplete orders");
        // orders are independent units of concurrency; repair them together
        let reports = futures::future::join_all(
            pending.iter().map(|order| self.effects.run_post_payment(&order.id)),
        )
        .await;

        let mut touched = 0;
        for (order, report) in pending.iter().zip(&reports) {
            if report.is_clean() {
                touched += 1;
            } else {
                tracing::warn!(order_id = %order.id, "Sweep pass left order incomplete");
            }
        }
        touched
    }
}
