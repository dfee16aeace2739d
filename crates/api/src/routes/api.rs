use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use common::{OrderSide, TradeRecord};

use crate::{auth::require_auth, AppState};

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/historical_actions", get(get_historical_actions))
        .route("/api/trades", get(get_trades))
        .route("/api/performance", get(get_performance))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// ─── Historical actions ───────────────────────────────────────────────────────

/// Every trade the live loop has recorded, oldest first.
async fn get_historical_actions(State(state): State<AppState>) -> Json<Vec<TradeRecord>> {
    Json(state.reports.borrow().trades.clone())
}

// ─── Trades ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TradesQuery {
    page: Option<usize>,
    limit: Option<usize>,
    side: Option<OrderSide>,
}

/// Paged view of the ledger, newest first, optionally filtered by side.
async fn get_trades(State(state): State<AppState>, Query(q): Query<TradesQuery>) -> Json<Value> {
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let offset = (page - 1).saturating_mul(limit);

    let report = state.reports.borrow();
    let matching: Vec<&TradeRecord> = report
        .trades
        .iter()
        .rev()
        .filter(|t| q.side.map_or(true, |side| t.action == side))
        .collect();
    let trades: Vec<&TradeRecord> = matching.iter().copied().skip(offset).take(limit).collect();

    Json(json!({
        "trades": trades,
        "total": matching.len(),
        "page": page,
        "limit": limit,
    }))
}

// ─── Performance ──────────────────────────────────────────────────────────────

async fn get_performance(State(state): State<AppState>) -> Json<Value> {
    let report = state.reports.borrow();
    let summary = report.summary;
    let (buys, sells) = report
        .trades
        .iter()
        .fold((0usize, 0usize), |(b, s), t| match t.action {
            OrderSide::Buy => (b + 1, s),
            OrderSide::Sell => (b, s + 1),
        });

    Json(json!({
        "initial_balance": summary.initial_balance,
        "current_balance": summary.current_balance,
        "profit_loss": summary.profit_loss,
        "trade_count": report.trades.len(),
        "buy_count": buys,
        "sell_count": sells,
        "open_positions": report.open_positions,
    }))
}
