//! Alert Center - Consumer Side of the Alert Channel
//!
//! Collects every alert published on the broadcast channel into an
//! `AlertBook`, logs it, and serves reads and removals to the HTTP API.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::alert::{Alert, AlertBook, AlertKind};

/// Shared alert list fed from the alert channel.
#[derive(Clone, Default)]
pub struct AlertCenter {
    book: Arc<RwLock<AlertBook>>,
}

impl AlertCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `alert_rx` until shutdown or until the channel closes.
    #[instrument(skip(self, alert_rx, shutdown_rx))]
    pub async fn run(
        &self,
        mut alert_rx: broadcast::Receiver<Alert>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        info!("Alert center started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Alert center shutting down");
                    return Ok(());
                }
                alert = alert_rx.recv() => {
                    match alert {
                        Ok(a) => self.record(a).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(dropped = n, "Alert center lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Alert channel closed");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Append one alert.
    pub async fn record(&self, alert: Alert) {
        match alert.kind() {
            AlertKind::Weather => warn!(id = %alert.id(), message = alert.message(), "Weather alert"),
            AlertKind::Price => info!(id = %alert.id(), message = alert.message(), "Price alert"),
        }
        self.book.write().await.push(alert);
    }

    /// All alerts in arrival order.
    pub async fn alerts(&self) -> Vec<Alert> {
        self.book.read().await.to_vec()
    }

    pub async fn latest(&self) -> Option<Alert> {
        self.book.read().await.latest().cloned()
    }

    /// Remove one alert by id. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.book.write().await.remove(id)
    }

    pub async fn clear(&self) {
        self.book.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.book.read().await.len()
    }
}
