//! Dashboard HTTP API
//!
//! JSON view over the dashboard state, the alert list and favorites,
//! plus manual refresh endpoints and the health probes. Served with
//! axum 0.7 and shut down on the global shutdown broadcast.

pub mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::adapters::metrics::{health_routes, HealthState};
use crate::usecases::alert_center::AlertCenter;
use crate::usecases::dashboard::DashboardService;

/// State shared by every API handler.
#[derive(Clone)]
pub struct ApiState {
    pub dashboard: Arc<DashboardService>,
    pub alerts: AlertCenter,
}

/// Build the full router: API routes plus `/live` and `/ready`.
pub fn router(state: ApiState, health: HealthState) -> Router {
    Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/alerts",
            get(handlers::list_alerts).delete(handlers::clear_alerts),
        )
        .route("/alerts/:id", delete(handlers::dismiss_alert))
        .route("/favorites/cities/:city", post(handlers::toggle_city))
        .route("/favorites/cryptos/:id", post(handlers::toggle_crypto))
        .route("/refresh", post(handlers::refresh_all))
        .route("/weather/:city/refresh", post(handlers::refresh_weather))
        .route("/weather/:city/forecast", post(handlers::refresh_forecast))
        .route("/weather/:city/history", post(handlers::refresh_history))
        .route("/crypto/:id/refresh", post(handlers::refresh_coin))
        .route("/news/refresh", post(handlers::refresh_news))
        .with_state(state)
        .merge(health_routes(health))
}

/// Axum server for the dashboard API.
pub struct ApiServer {
    state: ApiState,
    health: HealthState,
    bind_address: String,
}

impl ApiServer {
    pub fn new(state: ApiState, health: HealthState, bind_address: impl Into<String>) -> Self {
        Self {
            state,
            health,
            bind_address: bind_address.into(),
        }
    }

    /// Serve until the shutdown broadcast fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = router(self.state, self.health);
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!(address = %self.bind_address, "Dashboard API started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
