//! REST accounting client
//!
//! One vendor covers both concerns: invoice documents and the payment
//! ledger. The struct implements [`InvoiceService`] and [`AccountingApi`]
//! so the orchestrator can still treat them as independent actions.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use shared::order::Order;

use super::{AccountingApi, GatewayError, GatewayResult, Invoice, InvoiceService};
use async_trait::async_trait;

/// Accounting vendor client (invoices + ledger)
#[derive(Clone)]
pub struct RestAccounting {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    provider: String,
}

impl RestAccounting {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            provider: provider.into(),
        }
    }
}

/// Invoice-creation response
#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    invoice_id: String,
    invoice_url: Option<String>,
}

#[async_trait]
impl InvoiceService for RestAccounting {
    async fn generate(&self, order: &Order) -> GatewayResult<Invoice> {
        let line_items: Vec<_> = order
            .items
            .iter()
            .map(|i| {
                json!({
                    "name": i.name,
                    "rate": i.unit_price,
                    "quantity": i.quantity,
                })
            })
            .collect();

        let response = self
            .http
            .post(format!("{}/v1/invoices", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "reference": order.id,
                "currency": order.currency,
                "total": order.total,
                "line_items": line_items,
                "customer_name": order.shipping_address.name,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("invoice creation returned {}", response.status()),
            });
        }

        let body: InvoiceResponse =
            response.json().await.map_err(|e| GatewayError::BadResponse {
                provider: self.provider.clone(),
                detail: e.to_string(),
            })?;

        Ok(Invoice {
            invoice_id: body.invoice_id,
            invoice_url: body.invoice_url,
        })
    }
}

#[async_trait]
impl AccountingApi for RestAccounting {
    async fn record_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        method: Option<&str>,
        reference_id: &str,
    ) -> GatewayResult<()> {
        let response = self
            .http
            .post(format!("{}/v1/payments", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "invoice_id": invoice_id,
                "amount": amount,
                "payment_mode": method,
                // ledger-side idempotency key
                "reference_id": reference_id,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                provider: self.provider.clone(),
                detail: format!("payment recording returned {}", response.status()),
            });
        }
        Ok(())
    }
}
