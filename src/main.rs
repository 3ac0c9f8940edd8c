//! CryptoWeather Nexus - Entry Point
//!
//! Wires configuration, logging, the upstream sources, the live price
//! monitor and the HTTP surfaces. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config (path from the first CLI argument, default config.toml)
//! 2. Init tracing (JSON structured logging)
//! 3. Create shutdown + alert channels and the metrics registry
//! 4. Load API keys from env vars and build the REST sources
//! 5. Build the application context (monitor, dashboard, alert center)
//! 6. Spawn alert center, dashboard polling, API and metrics servers
//! 7. Connect the live price feed
//! 8. Wait for SIGINT, then shut down (stop feed, drain tasks, exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use cryptoweather_nexus::adapters::feeds::CoinCapTransport;
use cryptoweather_nexus::adapters::http::{ApiServer, ApiState};
use cryptoweather_nexus::adapters::metrics::{HealthState, MetricsRegistry};
use cryptoweather_nexus::adapters::sources::{
    ApiKeys, CoinGeckoClient, HttpClient, HttpClientConfig, NewsDataClient, WeatherApiClient,
};
use cryptoweather_nexus::config::{self, AppConfig};
use cryptoweather_nexus::domain::alert::Alert;
use cryptoweather_nexus::domain::weather::WeatherThresholds;
use cryptoweather_nexus::usecases::alert_center::AlertCenter;
use cryptoweather_nexus::usecases::dashboard::DashboardService;
use cryptoweather_nexus::usecases::price_monitor::{MonitorConfig, PriceMonitor};

/// Capacity of the alert broadcast channel.
const ALERT_CHANNEL_CAPACITY: usize = 256;

/// Long-lived services shared by the spawned tasks.
struct AppContext {
    monitor: Arc<PriceMonitor>,
    dashboard: Arc<DashboardService>,
    alerts: AlertCenter,
    metrics: Arc<MetricsRegistry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ────────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        assets = config.feed.assets.len(),
        cities = config.dashboard.cities.len(),
        "Starting CryptoWeather Nexus"
    );

    // ── 3. Channels and metrics ──────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (alert_tx, _alert_rx) = broadcast::channel::<Alert>(ALERT_CHANNEL_CAPACITY);
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

    // ── 4-5. Sources and application context ────────────────
    let keys = ApiKeys::from_env();
    let ctx = build_context(&config, keys, alert_tx, Arc::clone(&metrics))?;

    // ── 6. Spawn long-running tasks ──────────────────────────
    let alerts_handle = {
        let alerts = ctx.alerts.clone();
        let alert_rx = ctx.monitor.subscribe_alerts();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = alerts.run(alert_rx, shutdown).await {
                error!(error = %e, "Alert center failed");
            }
        })
    };

    let dashboard_handle = {
        let dashboard = Arc::clone(&ctx.dashboard);
        let price_rx = ctx.monitor.subscribe_prices();
        let connection_rx = ctx.monitor.connection();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = dashboard.run(price_rx, connection_rx, shutdown).await {
                error!(error = %e, "Dashboard loop failed");
            }
        })
    };

    let api_handle = {
        let server = ApiServer::new(
            ApiState {
                dashboard: Arc::clone(&ctx.dashboard),
                alerts: ctx.alerts.clone(),
            },
            HealthState::new(ctx.monitor.connection()),
            config.server.bind_address.clone(),
        );
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server.run(shutdown).await {
                error!(error = %e, "Dashboard API failed");
            }
        })
    };

    let metrics_handle = config.server.metrics_enabled.then(|| {
        let metrics = Arc::clone(&ctx.metrics);
        let address = config.server.metrics_address.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(address, shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    // ── 7. Connect the live price feed ───────────────────────
    ctx.monitor.connect().await;
    info!("All tasks spawned, dashboard is running");

    // ── 8. Wait for SIGINT ───────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    ctx.monitor.disconnect().await;
    let _ = shutdown_tx.send(());

    for handle in [alerts_handle, dashboard_handle, api_handle] {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }

    info!(alerts = ctx.alerts.len().await, "Shutdown complete");
    Ok(())
}

/// Build sources and services from configuration.
fn build_context(
    config: &AppConfig,
    keys: ApiKeys,
    alert_tx: broadcast::Sender<Alert>,
    metrics: Arc<MetricsRegistry>,
) -> Result<AppContext> {
    let client = |base: &str| {
        HttpClient::new(HttpClientConfig::for_base(base, &config.api))
            .with_context(|| format!("Failed to create HTTP client for {base}"))
    };

    let weather = Arc::new(WeatherApiClient::new(
        client(&config.api.weather_url)?,
        keys.weather,
    ));
    let crypto = Arc::new(CoinGeckoClient::new(client(&config.api.crypto_url)?));
    let news = Arc::new(NewsDataClient::new(client(&config.api.news_url)?, keys.news));

    let dashboard = DashboardService::new(
        weather,
        crypto,
        news,
        config.dashboard.clone(),
        WeatherThresholds::from(&config.thresholds),
        alert_tx.clone(),
    )
    .with_metrics(Arc::clone(&metrics));

    let transport = Arc::new(CoinCapTransport::new(config.feed.ws_url.clone()));
    let monitor = PriceMonitor::new(transport, MonitorConfig::from(&config.feed), alert_tx)
        .with_metrics(Arc::clone(&metrics));

    Ok(AppContext {
        monitor: Arc::new(monitor),
        dashboard: Arc::new(dashboard),
        alerts: AlertCenter::new(),
        metrics,
    })
}
