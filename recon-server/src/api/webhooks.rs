//! Webhook entry points
//!
//! Verification happens on the raw body before any parsing or store
//! lookup: a forged request must not learn whether an order exists, and
//! must not cost a decode. Only after the MAC (payments) or token
//! (shipments) checks out is the payload decoded into a typed event and
//! handed to the reconciler.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::post,
};
use http::HeaderMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::order::{PaymentCaptured, PaymentEvent, PaymentFailed, ShipmentEvent};
use shared::util::now_millis;

use crate::core::ServerState;
use crate::recon::signature;
use crate::recon::{PaymentAck, ShipmentAck};
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/webhooks/payments/{provider}", post(payment_webhook))
        .route("/webhooks/shipments", post(shipment_webhook))
}

/// Neutral payment webhook envelope
///
/// Provider adapters in front of this service normalize vendor payloads to
/// this shape; the signature still covers the exact bytes delivered.
#[derive(Debug, Deserialize)]
struct PaymentWebhookBody {
    /// "payment.captured" | "payment.failed"
    event: String,
    txn_id: String,
    order_ref: String,
    amount: Option<Decimal>,
    currency: Option<String>,
    method: Option<String>,
    fee: Option<Decimal>,
    reason: Option<String>,
    occurred_at: Option<i64>,
}

impl PaymentWebhookBody {
    fn into_event(self, provider: &str) -> AppResult<PaymentEvent> {
        match self.event.as_str() {
            "payment.captured" => {
                let amount = self.amount.ok_or_else(|| {
                    AppError::Validation("captured event is missing an amount".to_string())
                })?;
                let currency = self.currency.ok_or_else(|| {
                    AppError::Validation("captured event is missing a currency".to_string())
                })?;
                Ok(PaymentEvent::Captured(PaymentCaptured {
                    provider: provider.to_string(),
                    txn_id: self.txn_id,
                    order_ref: self.order_ref,
                    amount,
                    currency,
                    method: self.method,
                    fee: self.fee,
                    occurred_at: self.occurred_at.unwrap_or_else(now_millis),
                }))
            }
            "payment.failed" => Ok(PaymentEvent::Failed(PaymentFailed {
                provider: provider.to_string(),
                txn_id: self.txn_id,
                order_ref: self.order_ref,
                reason: self.reason,
                occurred_at: self.occurred_at.unwrap_or_else(now_millis),
            })),
            other => Err(AppError::Validation(format!(
                "Unsupported event type: {}",
                other
            ))),
        }
    }
}

/// Payment provider callback
async fn payment_webhook(
    State(state): State<ServerState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<AppResponse<PaymentAck>>> {
    let Some(cfg) = state.config.payment_provider(&provider) else {
        return Err(AppError::NotFound(format!(
            "Unknown payment provider: {}",
            provider
        )));
    };

    let provided = headers
        .get(cfg.signature_header.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !signature::verify(&body, provided, &cfg.webhook_secret, cfg.scheme) {
        tracing::warn!(provider = %provider, "Rejected payment webhook: invalid signature");
        return Err(AppError::SignatureInvalid);
    }

    let payload: PaymentWebhookBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;
    let event = payload.into_event(&provider)?;

    let ack = state.payments.apply(&event).await?;
    Ok(ok(ack))
}

/// Shipping carrier callback
async fn shipment_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<AppResponse<ShipmentAck>>> {
    // Fail closed: no configured token means no accepted callbacks
    let Some(expected) = state.config.carrier_webhook_token.as_deref() else {
        tracing::warn!("Rejected shipment webhook: no carrier token configured");
        return Err(AppError::TokenInvalid);
    };
    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !signature::token_matches(provided, expected) {
        tracing::warn!("Rejected shipment webhook: invalid token");
        return Err(AppError::TokenInvalid);
    }

    let event: ShipmentEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;

    let ack = state.shipments.apply(&event).await?;
    Ok(ok(ack))
}
