//! Shipment API handlers

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use shared::order::Order;

use crate::core::ServerState;
use crate::recon::ShipmentSync;
use crate::utils::{AppError, AppResponse, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/orders/{id}/shipment", post(create_or_sync))
        .route("/orders/missing-shipment", get(list_missing_shipment))
}

/// Idempotent manual shipment trigger
///
/// An order that already has a tracking number reports it back without a
/// second carrier call.
async fn create_or_sync(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<ShipmentSync>>> {
    let sync = state.shipments.create_or_sync(&id).await?;
    Ok(ok(sync))
}

/// Paid orders with no tracking number (catch-up sweep input)
async fn list_missing_shipment(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state
        .store
        .list_missing_shipment()
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(ok(orders))
}
