//! Live Price Feed Monitor
//!
//! Owns one subscription to a push-price transport for a fixed asset
//! list. Every tick updates the per-asset price memory and is published
//! on a broadcast channel; a tick that moves an asset by at least the
//! configured percentage also raises a price `Alert`.
//!
//! Connection state is published through a `watch` channel that only the
//! monitor writes. Transport errors flip it to `false` and raise an
//! alert; the supervisor task then reconnects with bounded exponential
//! backoff and jitter, giving up after the configured attempt count.
//! `disconnect()` stops the supervisor, so no reconnect can outlive it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::FeedConfig;
use crate::domain::alert::Alert;
use crate::domain::backoff::ReconnectPolicy;
use crate::domain::price::{AssetId, PriceTick, PriceTracker, TrackedPrice};
use crate::ports::price_feed::{FeedEvent, FeedSession, PriceTransport};

/// Alert text raised on transport failure.
pub const FEED_ERROR_MESSAGE: &str = "Error connecting to crypto price feed";

/// Monitor tuning.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Assets to subscribe to.
    pub assets: Vec<AssetId>,
    /// Minimum absolute percentage move that raises an alert.
    pub threshold_pct: f64,
    /// Reconnect schedule.
    pub reconnect: ReconnectPolicy,
    /// Broadcast buffer for ticks.
    pub event_buffer: usize,
}

impl From<&FeedConfig> for MonitorConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            assets: config.assets.clone(),
            threshold_pct: config.alert_threshold_pct,
            reconnect: config.reconnect_policy(),
            event_buffer: config.event_buffer,
        }
    }
}

/// How a single session ended.
#[derive(Debug)]
enum SessionEnd {
    /// `disconnect()` was requested.
    Stopped,
    /// The remote side went away without an error.
    Closed,
    /// The transport reported an error.
    Failed(String),
}

/// State shared between the monitor handle and its supervisor task.
struct Shared {
    transport: Arc<dyn PriceTransport>,
    config: MonitorConfig,
    tracker: RwLock<PriceTracker>,
    connected_tx: watch::Sender<bool>,
    price_tx: broadcast::Sender<PriceTick>,
    alert_tx: broadcast::Sender<Alert>,
    metrics: Option<Arc<MetricsRegistry>>,
}

/// Running supervisor task and its stop signal.
struct Supervisor {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Live price feed monitor.
///
/// Constructed once at startup and held in the application context.
/// Consumers read `connection()`, `subscribe_prices()` and the alert
/// channel; only the monitor mutates its state.
pub struct PriceMonitor {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl PriceMonitor {
    /// Create a monitor. Alerts are published on `alert_tx`.
    pub fn new(
        transport: Arc<dyn PriceTransport>,
        config: MonitorConfig,
        alert_tx: broadcast::Sender<Alert>,
    ) -> Self {
        let (connected_tx, _) = watch::channel(false);
        let (price_tx, _) = broadcast::channel(config.event_buffer.max(1));

        Self {
            shared: Arc::new(Shared {
                transport,
                tracker: RwLock::new(PriceTracker::new(config.threshold_pct)),
                config,
                connected_tx,
                price_tx,
                alert_tx,
                metrics: None,
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// Attach a metrics registry. Must be called before `connect()`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.metrics = Some(metrics);
        } else {
            warn!("Metrics attached after monitor was shared; ignoring");
        }
        self
    }

    /// Start the subscription supervisor. No-op while one is running.
    pub async fn connect(&self) {
        let mut guard = self.supervisor.lock().await;

        if let Some(running) = guard.as_ref() {
            if !running.handle.is_finished() {
                debug!("Price monitor already connected");
                return;
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            shared.supervise(stop_rx).await;
        });

        info!(
            transport = self.shared.transport.name(),
            assets = ?self.shared.config.assets,
            "Price monitor started"
        );

        *guard = Some(Supervisor { stop_tx, handle });
    }

    /// Stop the supervisor and close the subscription. Idempotent.
    pub async fn disconnect(&self) {
        let supervisor = self.supervisor.lock().await.take();

        if let Some(Supervisor { stop_tx, mut handle }) = supervisor {
            let _ = stop_tx.send(true);
            if tokio::time::timeout(Duration::from_secs(1), &mut handle)
                .await
                .is_err()
            {
                warn!("Price monitor did not stop in time, aborting");
                handle.abort();
            }
            info!("Price monitor disconnected");
        }

        self.shared.set_connected(false);
    }

    /// Receiver for connection-state changes.
    pub fn connection(&self) -> watch::Receiver<bool> {
        self.shared.connected_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected_tx.borrow()
    }

    /// Receiver for every processed tick.
    pub fn subscribe_prices(&self) -> broadcast::Receiver<PriceTick> {
        self.shared.price_tx.subscribe()
    }

    /// Receiver for alerts (same channel the monitor was built with).
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.shared.alert_tx.subscribe()
    }

    /// Stored state for one asset.
    pub async fn latest_price(&self, asset: &str) -> Option<TrackedPrice> {
        self.shared.tracker.read().await.get(asset).cloned()
    }

    /// Current price of every asset observed so far.
    pub async fn latest_prices(&self) -> HashMap<AssetId, f64> {
        self.shared.tracker.read().await.latest()
    }

    /// Process one tick as if it had arrived from the transport.
    pub async fn handle_tick(&self, asset: &str, price: f64) {
        self.shared.handle_tick(asset, price).await;
    }
}

impl Shared {
    /// Connect, stream, and reconnect until stopped or out of attempts.
    #[instrument(skip(self, stop_rx), fields(transport = self.transport.name()))]
    async fn supervise(&self, mut stop_rx: watch::Receiver<bool>) {
        let mut attempt: u32 = 0;

        loop {
            match self.transport.open(&self.config.assets).await {
                Ok(session) => {
                    attempt = 0;
                    self.set_connected(true);
                    info!("Price feed connected");

                    let end = self.pump(session, &mut stop_rx).await;
                    self.set_connected(false);

                    match end {
                        SessionEnd::Stopped => return,
                        SessionEnd::Closed => warn!("Price feed disconnected"),
                        SessionEnd::Failed(reason) => {
                            error!(error = %reason, "Price feed error");
                            self.raise(Alert::price(FEED_ERROR_MESSAGE));
                        }
                    }
                }
                Err(e) => {
                    self.set_connected(false);
                    error!(error = %e, "Price feed connection failed");
                    self.raise(Alert::price(FEED_ERROR_MESSAGE));
                }
            }

            attempt += 1;
            let Some(delay) = self.config.reconnect.delay_for_attempt(attempt) else {
                error!(
                    attempts = self.config.reconnect.max_attempts,
                    "Price feed reconnect attempts exhausted"
                );
                self.raise(Alert::price(format!(
                    "Crypto price feed unavailable after {} reconnect attempts",
                    self.config.reconnect.max_attempts
                )));
                return;
            };

            if let Some(metrics) = &self.metrics {
                metrics.reconnect_attempts.inc();
            }
            info!(attempt, delay_ms = delay.as_millis(), "Reconnecting price feed");

            tokio::select! {
                biased;
                _ = stop_rx.changed() => return,
                () = tokio::time::sleep(delay) => {}
            }
            if *stop_rx.borrow() {
                return;
            }
        }
    }

    /// Drain one session until it ends or a stop is requested.
    async fn pump(&self, session: FeedSession, stop_rx: &mut watch::Receiver<bool>) -> SessionEnd {
        let FeedSession { mut events, close } = session;

        let end = loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break SessionEnd::Stopped,
                event = events.recv() => match event {
                    Some(FeedEvent::Prices(prices)) => {
                        for (asset, price) in prices {
                            self.handle_tick(&asset, price).await;
                        }
                    }
                    Some(FeedEvent::Error(reason)) => break SessionEnd::Failed(reason),
                    Some(FeedEvent::Closed) | None => break SessionEnd::Closed,
                },
            }
        };

        let _ = close.send(());
        end
    }

    async fn handle_tick(&self, asset: &str, price: f64) {
        if !price.is_finite() || price <= 0.0 {
            debug!(asset, price, "Discarding unusable price");
            return;
        }

        let timestamp_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let moved = self.tracker.write().await.observe(asset, price, timestamp_ms);

        if let Some(metrics) = &self.metrics {
            metrics.ticks.with_label_values(&[asset]).inc();
            metrics.last_price.with_label_values(&[asset]).set(price);
        }

        if let Some(price_move) = moved {
            info!(
                asset,
                price,
                change_pct = price_move.percent_change,
                "Price threshold crossed"
            );
            self.raise(Alert::price(price_move.message()));
        }

        // Broadcast (ignore if no receivers)
        let _ = self.price_tx.send(PriceTick {
            asset: asset.to_string(),
            price,
            timestamp_ms,
        });
    }

    fn raise(&self, alert: Alert) {
        if let Some(metrics) = &self.metrics {
            let kind = alert.kind().to_string();
            metrics.alerts.with_label_values(&[kind.as_str()]).inc();
        }
        let _ = self.alert_tx.send(alert);
    }

    fn set_connected(&self, connected: bool) {
        self.connected_tx.send_if_modified(|current| {
            let changed = *current != connected;
            *current = connected;
            changed
        });
        if let Some(metrics) = &self.metrics {
            metrics
                .feed_connected
                .with_label_values(&[self.transport.name()])
                .set(if connected { 1.0 } else { 0.0 });
        }
    }
}
