use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint; no auth required.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let report = state.reports.borrow();
    Json(json!({
        "status": "ok",
        "mode": state.trading_mode.to_string(),
        "trades": report.trades.len(),
        "open_positions": report.open_positions,
    }))
}
