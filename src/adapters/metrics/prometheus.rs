//! Prometheus Metrics Registry - Dashboard Observability
//!
//! Registers and exposes Prometheus metrics on :9090. Covers price
//! ticks, alerts, live-feed connectivity and upstream fetch health.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the dashboard service.
///
/// All metrics follow the naming convention `nexus_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Price ticks processed, by asset.
    pub ticks: IntCounterVec,
    /// Last observed price, by asset.
    pub last_price: GaugeVec,
    /// Alerts raised, by kind.
    pub alerts: IntCounterVec,
    /// Feed connection status (1 = connected, 0 = disconnected).
    pub feed_connected: GaugeVec,
    /// Reconnect attempts scheduled by the price monitor.
    pub reconnect_attempts: IntCounter,
    /// Failed upstream fetches, by feed.
    pub fetch_errors: IntCounterVec,
    /// Upstream fetch latency in milliseconds, by feed.
    pub fetch_latency_ms: HistogramVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let ticks = IntCounterVec::new(
            Opts::new("nexus_price_ticks_total", "Price ticks processed"),
            &["asset"],
        )?;

        let last_price = GaugeVec::new(
            Opts::new("nexus_last_price_usd", "Last observed price in USD"),
            &["asset"],
        )?;

        let alerts = IntCounterVec::new(
            Opts::new("nexus_alerts_total", "Alerts raised"),
            &["kind"],
        )?;

        let feed_connected = GaugeVec::new(
            Opts::new(
                "nexus_feed_connected",
                "Feed connection status (1=connected, 0=disconnected)",
            ),
            &["source"],
        )?;

        let reconnect_attempts = IntCounter::new(
            "nexus_feed_reconnect_attempts_total",
            "Reconnect attempts scheduled by the price monitor",
        )?;

        let fetch_errors = IntCounterVec::new(
            Opts::new("nexus_fetch_errors_total", "Failed upstream fetches"),
            &["feed"],
        )?;

        let fetch_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "nexus_fetch_latency_ms",
                "Upstream fetch latency in milliseconds",
            )
            .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]),
            &["feed"],
        )?;

        // Register all metrics
        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(last_price.clone()))?;
        registry.register(Box::new(alerts.clone()))?;
        registry.register(Box::new(feed_connected.clone()))?;
        registry.register(Box::new(reconnect_attempts.clone()))?;
        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(fetch_latency_ms.clone()))?;

        Ok(Self {
            registry,
            ticks,
            last_price,
            alerts,
            feed_connected,
            reconnect_attempts,
            fetch_errors,
            fetch_latency_ms,
        })
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
