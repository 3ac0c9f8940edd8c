//! Price Feed Port - Push-Price Transport Interface
//!
//! Defines the trait the price monitor uses to open a subscription to a
//! push-price service. A subscription is a stream of `FeedEvent`s plus a
//! close handle; dropping the session closes the transport.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::domain::price::AssetId;

/// One event delivered by an open subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A batch of prices, in the order the transport delivered them.
    Prices(Vec<(AssetId, f64)>),
    /// The transport reported an error; the session is over.
    Error(String),
    /// The remote side closed the connection cleanly.
    Closed,
}

/// An open subscription.
///
/// The session ends when `events` yields `Error`/`Closed` or returns
/// `None`. Sending on (or dropping) `close` asks the transport to shut
/// the connection down.
#[derive(Debug)]
pub struct FeedSession {
    pub events: mpsc::Receiver<FeedEvent>,
    pub close: oneshot::Sender<()>,
}

impl FeedSession {
    /// Build a session from its two halves.
    pub fn new(events: mpsc::Receiver<FeedEvent>, close: oneshot::Sender<()>) -> Self {
        Self { events, close }
    }

    /// Ask the transport to close. Safe to call after the transport is gone.
    pub fn close(self) {
        let _ = self.close.send(());
    }
}

/// Trait for push-price transports.
///
/// Implementors connect to a real-time price source for a fixed asset
/// list. The monitor never depends on wire details.
#[async_trait]
pub trait PriceTransport: Send + Sync + 'static {
    /// Open a subscription for the given assets.
    ///
    /// Returns once the connection is established. An `Err` is a
    /// transport-level connection failure.
    async fn open(&self, assets: &[AssetId]) -> anyhow::Result<FeedSession>;

    /// Short name used in logs and metrics labels.
    fn name(&self) -> &'static str;
}
