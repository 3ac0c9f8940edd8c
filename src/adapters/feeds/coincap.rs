//! CoinCap WebSocket Transport - Live USD Prices
//!
//! Connects to CoinCap's price stream for a fixed asset list. Each text
//! frame is a flat JSON object mapping asset id to price, e.g.
//! `{"bitcoin":"64123.51","ethereum":"3150.02"}`. Values arrive as
//! strings; numbers are accepted too.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

use crate::domain::price::AssetId;
use crate::ports::price_feed::{FeedEvent, FeedSession, PriceTransport};

/// Capacity of the per-session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// `PriceTransport` over the CoinCap prices WebSocket.
pub struct CoinCapTransport {
    ws_url: String,
}

impl CoinCapTransport {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    /// Subscription URL for the given assets.
    pub fn subscription_url(&self, assets: &[AssetId]) -> String {
        format!("{}?assets={}", self.ws_url, assets.join(","))
    }
}

#[async_trait]
impl PriceTransport for CoinCapTransport {
    #[instrument(skip(self))]
    async fn open(&self, assets: &[AssetId]) -> Result<FeedSession> {
        let url = self.subscription_url(assets);
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .context("CoinCap WebSocket connection failed")?;

        info!(url = %url, "CoinCap WebSocket connected");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (close_tx, mut close_rx) = oneshot::channel::<()>();
        let (_write, mut read) = ws_stream.split();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut close_rx => {
                        debug!("CoinCap session closed by monitor");
                        return;
                    }
                    msg = read.next() => {
                        let event = match msg {
                            Some(Ok(Message::Text(text))) => {
                                let prices = parse_price_frame(&text);
                                if prices.is_empty() {
                                    continue;
                                }
                                FeedEvent::Prices(prices)
                            }
                            Some(Ok(Message::Close(frame))) => {
                                info!(frame = ?frame, "CoinCap WebSocket closed by server");
                                FeedEvent::Closed
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => {
                                warn!(error = %e, "CoinCap WebSocket error");
                                FeedEvent::Error(e.to_string())
                            }
                            None => FeedEvent::Closed,
                        };

                        let terminal = !matches!(event, FeedEvent::Prices(_));
                        if event_tx.send(event).await.is_err() || terminal {
                            return;
                        }
                    }
                }
            }
        });

        Ok(FeedSession::new(event_rx, close_tx))
    }

    fn name(&self) -> &'static str {
        "coincap"
    }
}

/// Parse one price frame into `(asset, price)` pairs.
///
/// Entries whose value is neither a numeric string nor a number are
/// skipped. A frame that is not a JSON object yields nothing.
pub fn parse_price_frame(text: &str) -> Vec<(AssetId, f64)> {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text)
    else {
        debug!(len = text.len(), "Ignoring non-object CoinCap frame");
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(asset, value)| {
            let price = match &value {
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                serde_json::Value::Number(n) => n.as_f64(),
                _ => None,
            }?;
            Some((asset, price))
        })
        .collect()
}
