//! Health Checks - Liveness and Readiness Probes
//!
//! `/live` always answers while the process runs. `/ready` answers 200
//! only while the live price feed is connected, so an orchestrator can
//! tell a running-but-disconnected dashboard from a healthy one.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;

/// Shared health state polled by the readiness probe.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Connection state of the live price feed.
    feed_connected: watch::Receiver<bool>,
}

impl HealthState {
    pub fn new(feed_connected: watch::Receiver<bool>) -> Self {
        Self { feed_connected }
    }

    pub fn is_ready(&self) -> bool {
        *self.feed_connected.borrow()
    }
}

/// Router serving `/live` and `/ready`.
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_follows_feed() {
        let (tx, rx) = watch::channel(false);
        let state = HealthState::new(rx);
        assert!(!state.is_ready());
        tx.send_replace(true);
        assert!(state.is_ready());
    }
}
