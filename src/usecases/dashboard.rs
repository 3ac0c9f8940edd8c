//! Dashboard Service - Feed Orchestration and Dashboard State
//!
//! Fetches weather, crypto market and news data through the source
//! ports, keeps one `FeedState` per feed, and serves a serializable
//! snapshot. A failing feed records its error string and keeps its
//! previous data; it never affects the other feeds.
//!
//! The polling loop also merges live ticks from the price monitor into
//! the crypto section and mirrors the monitor's connection flag.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, Fuse, FusedFuture, FutureExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::DashboardConfig;
use crate::domain::alert::Alert;
use crate::domain::favorites::Favorites;
use crate::domain::market::{CoinDetail, CoinId, CoinMarket, NewsItem};
use crate::domain::price::PriceTick;
use crate::domain::weather::{CurrentWeather, Forecast, HistoricalDay, WeatherThresholds};
use crate::ports::sources::{CryptoSource, NewsSource, SourceResult, WeatherSource};

/// Data of one feed plus the outcome of its last fetch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState<T> {
    pub data: T,
    /// Error of the most recent failed fetch; cleared on success.
    pub error: Option<String>,
    /// Time of the most recent successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> FeedState<T> {
    /// Apply a successful fetch.
    fn succeed(&mut self, update: impl FnOnce(&mut T)) {
        update(&mut self.data);
        self.error = None;
        self.last_updated = Some(Utc::now());
    }

    /// Record a failed fetch, keeping the previous data.
    fn fail(&mut self, error: String) {
        self.error = Some(error);
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Default)]
struct DashboardState {
    weather: FeedState<BTreeMap<String, CurrentWeather>>,
    forecasts: FeedState<BTreeMap<String, Forecast>>,
    history: FeedState<BTreeMap<String, HistoricalDay>>,
    crypto: FeedState<BTreeMap<CoinId, CoinMarket>>,
    coin_details: FeedState<BTreeMap<CoinId, CoinDetail>>,
    news: FeedState<Vec<NewsItem>>,
    favorites: Favorites,
    live: bool,
}

/// Favorite lists as shown in the favorites section.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FavoritesView {
    pub cities: Vec<String>,
    pub cryptos: Vec<String>,
}

/// Serializable point-in-time copy of the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub weather: FeedState<BTreeMap<String, CurrentWeather>>,
    pub forecasts: FeedState<BTreeMap<String, Forecast>>,
    pub history: FeedState<BTreeMap<String, HistoricalDay>>,
    pub crypto: FeedState<BTreeMap<CoinId, CoinMarket>>,
    pub coin_details: FeedState<BTreeMap<CoinId, CoinDetail>>,
    pub news: FeedState<Vec<NewsItem>>,
    pub favorites: FavoritesView,
    /// Whether the live price feed is connected.
    pub live: bool,
}

/// Dashboard use case.
pub struct DashboardService {
    weather: Arc<dyn WeatherSource>,
    crypto: Arc<dyn CryptoSource>,
    news: Arc<dyn NewsSource>,
    config: DashboardConfig,
    thresholds: WeatherThresholds,
    alert_tx: broadcast::Sender<Alert>,
    state: RwLock<DashboardState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl DashboardService {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        crypto: Arc<dyn CryptoSource>,
        news: Arc<dyn NewsSource>,
        config: DashboardConfig,
        thresholds: WeatherThresholds,
        alert_tx: broadcast::Sender<Alert>,
    ) -> Self {
        Self {
            weather,
            crypto,
            news,
            config,
            thresholds,
            alert_tx,
            state: RwLock::new(DashboardState::default()),
            metrics: None,
        }
    }

    /// Attach a metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Refresh all three feeds concurrently.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) {
        let ids = self.config.cryptos.clone();
        let started = Instant::now();

        let (cities_refreshed, crypto, news) = tokio::join!(
            self.refresh_all_weather(),
            self.refresh_crypto(&ids),
            self.refresh_news(),
        );

        info!(
            cities_refreshed,
            cities = self.config.cities.len(),
            crypto_ok = crypto.is_ok(),
            news_ok = news.is_ok(),
            elapsed_ms = started.elapsed().as_millis(),
            "Dashboard refreshed"
        );
    }

    /// Refresh current weather for every configured city.
    ///
    /// Returns how many cities refreshed successfully.
    async fn refresh_all_weather(&self) -> usize {
        let results = join_all(self.config.cities.iter().map(|c| self.refresh_weather(c))).await;
        results.iter().filter(|r| r.is_ok()).count()
    }

    /// Refresh current weather for one city and raise threshold alerts.
    pub async fn refresh_weather(&self, city: &str) -> SourceResult<()> {
        match self.timed("weather", self.weather.current(city)).await {
            Ok(current) => {
                for alert in self.thresholds.evaluate(city, &current) {
                    let _ = self.alert_tx.send(alert);
                }
                let mut state = self.state.write().await;
                state.weather.succeed(|data| {
                    data.insert(city.to_string(), current);
                });
                Ok(())
            }
            Err(e) => {
                warn!(city, error = %e, "Weather fetch failed");
                self.state.write().await.weather.fail(format!("{city}: {e}"));
                Err(e)
            }
        }
    }

    /// Fetch the multi-day forecast for one city.
    pub async fn refresh_forecast(&self, city: &str) -> SourceResult<()> {
        let days = self.config.forecast_days;
        match self.timed("forecast", self.weather.forecast(city, days)).await {
            Ok(forecast) => {
                self.state.write().await.forecasts.succeed(|data| {
                    data.insert(city.to_string(), forecast);
                });
                Ok(())
            }
            Err(e) => {
                warn!(city, error = %e, "Forecast fetch failed");
                self.state.write().await.forecasts.fail(format!("{city}: {e}"));
                Err(e)
            }
        }
    }

    /// Fetch yesterday's hourly weather for one city.
    pub async fn refresh_history(&self, city: &str) -> SourceResult<()> {
        match self.timed("history", self.weather.history(city)).await {
            Ok(day) => {
                self.state.write().await.history.succeed(|data| {
                    data.insert(city.to_string(), day);
                });
                Ok(())
            }
            Err(e) => {
                warn!(city, error = %e, "History fetch failed");
                self.state.write().await.history.fail(format!("{city}: {e}"));
                Err(e)
            }
        }
    }

    /// Fetch market rows for the given coin ids.
    pub async fn refresh_crypto(&self, ids: &[CoinId]) -> SourceResult<()> {
        match self.timed("crypto", self.crypto.markets(ids)).await {
            Ok(markets) => {
                self.state.write().await.crypto.succeed(|data| {
                    for market in markets {
                        data.insert(market.id.clone(), market);
                    }
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Crypto fetch failed");
                self.state.write().await.crypto.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the detail view of one coin.
    pub async fn refresh_coin(&self, id: &str) -> SourceResult<()> {
        match self.timed("coin", self.crypto.coin(id)).await {
            Ok(detail) => {
                self.state.write().await.coin_details.succeed(|data| {
                    data.insert(id.to_string(), detail);
                });
                Ok(())
            }
            Err(e) => {
                warn!(coin = id, error = %e, "Coin detail fetch failed");
                self.state.write().await.coin_details.fail(format!("{id}: {e}"));
                Err(e)
            }
        }
    }

    /// Fetch headlines for the configured query.
    pub async fn refresh_news(&self) -> SourceResult<()> {
        let fetch = self
            .news
            .headlines(&self.config.news_query, &self.config.news_language);
        match self.timed("news", fetch).await {
            Ok(items) => {
                self.state.write().await.news.succeed(|data| *data = items);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "News fetch failed");
                self.state.write().await.news.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Merge a live tick into the crypto section.
    pub async fn apply_tick(&self, tick: &PriceTick) -> bool {
        let mut state = self.state.write().await;
        state
            .crypto
            .data
            .get_mut(&tick.asset)
            .is_some_and(|market| market.apply_tick(tick))
    }

    /// Mirror the price monitor's connection flag.
    pub async fn set_live(&self, live: bool) {
        self.state.write().await.live = live;
    }

    pub async fn toggle_city_favorite(&self, city: &str) -> bool {
        self.state.write().await.favorites.toggle_city(city)
    }

    pub async fn toggle_crypto_favorite(&self, id: &str) -> bool {
        self.state.write().await.favorites.toggle_crypto(id)
    }

    pub async fn set_city_favorite(&self, city: &str, is_favorite: bool) {
        self.state.write().await.favorites.set_city(city, is_favorite);
    }

    pub async fn set_crypto_favorite(&self, id: &str, is_favorite: bool) {
        self.state.write().await.favorites.set_crypto(id, is_favorite);
    }

    pub async fn favorites(&self) -> FavoritesView {
        let state = self.state.read().await;
        FavoritesView {
            cities: state.favorites.favorite_cities(),
            cryptos: state.favorites.favorite_cryptos(),
        }
    }

    /// Point-in-time copy of the dashboard, news capped at `news_limit`.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.read().await;

        let mut news = state.news.clone();
        news.data.truncate(self.config.news_limit);

        DashboardSnapshot {
            weather: state.weather.clone(),
            forecasts: state.forecasts.clone(),
            history: state.history.clone(),
            crypto: state.crypto.clone(),
            coin_details: state.coin_details.clone(),
            news,
            favorites: FavoritesView {
                cities: state.favorites.favorite_cities(),
                cryptos: state.favorites.favorite_cryptos(),
            },
            live: state.live,
        }
    }

    /// Poll all feeds on the configured interval, merge live ticks, and
    /// track the live flag until shutdown.
    #[instrument(skip(self, price_rx, connection_rx, shutdown_rx))]
    pub async fn run(
        &self,
        mut price_rx: broadcast::Receiver<PriceTick>,
        mut connection_rx: watch::Receiver<bool>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let period = Duration::from_secs(self.config.poll_interval_seconds);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut ticks_open = true;
        let mut connection_open = true;

        // In-flight refresh; polled alongside ticks so slow upstreams never
        // stall tick merging.
        let refresh = Fuse::terminated();
        tokio::pin!(refresh);

        let live = *connection_rx.borrow_and_update();
        self.set_live(live).await;
        info!(interval_s = period.as_secs(), "Dashboard polling started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Dashboard shutting down");
                    return Ok(());
                }
                changed = connection_rx.changed(), if connection_open => {
                    if changed.is_ok() {
                        let live = *connection_rx.borrow_and_update();
                        self.set_live(live).await;
                    } else {
                        connection_open = false;
                        self.set_live(false).await;
                    }
                }
                tick = price_rx.recv(), if ticks_open => {
                    match tick {
                        Ok(t) => {
                            if !self.apply_tick(&t).await {
                                debug!(asset = %t.asset, "Tick for coin not on dashboard");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(dropped = n, "Dashboard lagged behind price feed");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Price channel closed");
                            ticks_open = false;
                        }
                    }
                }
                () = &mut refresh, if !refresh.is_terminated() => {
                    debug!("Dashboard refresh settled");
                }
                _ = interval.tick() => {
                    if refresh.is_terminated() {
                        refresh.set(self.refresh_all().fuse());
                    } else {
                        debug!("Previous refresh still running, skipping this interval");
                    }
                }
            }
        }
    }

    /// Run a fetch, recording latency and failures.
    async fn timed<T>(
        &self,
        feed: &'static str,
        fetch: impl Future<Output = SourceResult<T>>,
    ) -> SourceResult<T> {
        let started = Instant::now();
        let result = fetch.await;

        if let Some(metrics) = &self.metrics {
            #[allow(clippy::cast_precision_loss)]
            let elapsed = started.elapsed().as_millis() as f64;
            metrics
                .fetch_latency_ms
                .with_label_values(&[feed])
                .observe(elapsed);
            if result.is_err() {
                metrics.fetch_errors.with_label_values(&[feed]).inc();
            }
        }

        result
    }
}
