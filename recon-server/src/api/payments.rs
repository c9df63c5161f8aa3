//! Client payment confirmation
//!
//! The browser-initiated finalization path: after the gateway checkout
//! flow completes, the client posts the payment id and the gateway's
//! handshake signature. The signature is checked first; the payment
//! details are then fetched from the gateway — the client's word is never
//! trusted for amounts — and run through the same reconciliation path as
//! the webhook.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::core::ServerState;
use crate::recon::PaymentAck;
use crate::recon::signature::verify_handshake;
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/payments/verify", post(verify_payment))
}

#[derive(Debug, Deserialize)]
struct VerifyPaymentRequest {
    order_id: String,
    payment_id: String,
    signature: String,
    /// Provider label recorded on the payment metadata
    provider: Option<String>,
}

async fn verify_payment(
    State(state): State<ServerState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<Json<AppResponse<PaymentAck>>> {
    if !verify_handshake(
        &req.order_id,
        &req.payment_id,
        &req.signature,
        &state.config.gateway_key_secret,
    ) {
        tracing::warn!(order_id = %req.order_id, "Rejected client confirmation: invalid handshake signature");
        return Err(AppError::SignatureInvalid);
    }

    let provider = req.provider.as_deref().unwrap_or("gateway");
    let ack = state
        .payments
        .finalize_client_payment(&req.order_id, &req.payment_id, provider)
        .await?;
    Ok(ok(ack))
}
