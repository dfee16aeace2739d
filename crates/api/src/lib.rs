mod auth;
pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{Result, StatusReport, TradingMode};

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Latest report published by the live loop after each tick.
    pub reports: watch::Receiver<StatusReport>,
    pub trading_mode: TradingMode,
    /// Bearer token for `/api/*`. `None` leaves the dashboard open.
    pub dashboard_token: Option<String>,
}

/// The full dashboard router, state applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Dashboard API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
