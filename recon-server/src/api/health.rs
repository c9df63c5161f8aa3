//! Health check

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{AppResponse, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    environment: String,
}

async fn health(State(state): State<ServerState>) -> Json<AppResponse<HealthStatus>> {
    ok(HealthStatus {
        status: "ok",
        environment: state.config.environment.clone(),
    })
}
