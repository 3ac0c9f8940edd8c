//! Data Source Ports - REST Feed Interfaces
//!
//! The dashboard reads weather, crypto market and news data through
//! these traits. Each call either returns normalized domain entities
//! or a `SourceError` that the dashboard turns into a per-feed error
//! string.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::market::{CoinDetail, CoinId, CoinMarket, NewsItem};
use crate::domain::weather::{CurrentWeather, Forecast, HistoricalDay};

/// Failure of a single upstream fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The API key for this provider is not set.
    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
    /// Network-level failure (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Transport(String),
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },
    /// Upstream answered, but not with the expected shape.
    #[error("invalid {0} data received")]
    InvalidPayload(&'static str),
    /// Upstream had nothing for the request.
    #[error("{0}")]
    NoData(String),
    /// The request was rejected before reaching upstream.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Weather provider.
#[async_trait]
pub trait WeatherSource: Send + Sync + 'static {
    /// Current conditions for a city.
    async fn current(&self, city: &str) -> SourceResult<CurrentWeather>;

    /// Daily forecast for the next `days` days.
    async fn forecast(&self, city: &str, days: u32) -> SourceResult<Forecast>;

    /// Yesterday's observed hourly weather.
    async fn history(&self, city: &str) -> SourceResult<HistoricalDay>;
}

/// Crypto market provider.
#[async_trait]
pub trait CryptoSource: Send + Sync + 'static {
    /// Market rows for the given coin ids, ordered by market cap.
    async fn markets(&self, ids: &[CoinId]) -> SourceResult<Vec<CoinMarket>>;

    /// Detail for one coin.
    async fn coin(&self, id: &str) -> SourceResult<CoinDetail>;
}

/// News provider.
#[async_trait]
pub trait NewsSource: Send + Sync + 'static {
    /// Headlines matching `query` in `language`.
    async fn headlines(&self, query: &str, language: &str) -> SourceResult<Vec<NewsItem>>;
}
