//! Integration Tests - Dashboard Service, Alert Center and HTTP API
//!
//! Feeds are mocked with mockall; each test drives the service the way
//! the polling loop or an API request would.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mockall::mock;
use mockall::predicate::eq;
use tokio::sync::{broadcast, watch};

use cryptoweather_nexus::adapters::http::{router, ApiState};
use cryptoweather_nexus::adapters::metrics::HealthState;
use cryptoweather_nexus::config::DashboardConfig;
use cryptoweather_nexus::domain::alert::{Alert, AlertKind};
use cryptoweather_nexus::domain::market::{CoinDetail, CoinId, CoinMarket, NewsItem};
use cryptoweather_nexus::domain::price::PriceTick;
use cryptoweather_nexus::domain::weather::{
    CurrentWeather, Forecast, HistoricalDay, WeatherThresholds,
};
use cryptoweather_nexus::ports::sources::{
    CryptoSource, NewsSource, SourceError, SourceResult, WeatherSource,
};
use cryptoweather_nexus::usecases::alert_center::AlertCenter;
use cryptoweather_nexus::usecases::dashboard::DashboardService;

// ---- Mock Definitions ----

mock! {
    pub Weather {}

    #[async_trait::async_trait]
    impl WeatherSource for Weather {
        async fn current(&self, city: &str) -> SourceResult<CurrentWeather>;
        async fn forecast(&self, city: &str, days: u32) -> SourceResult<Forecast>;
        async fn history(&self, city: &str) -> SourceResult<HistoricalDay>;
    }
}

mock! {
    pub Crypto {}

    #[async_trait::async_trait]
    impl CryptoSource for Crypto {
        async fn markets(&self, ids: &[CoinId]) -> SourceResult<Vec<CoinMarket>>;
        async fn coin(&self, id: &str) -> SourceResult<CoinDetail>;
    }
}

mock! {
    pub News {}

    #[async_trait::async_trait]
    impl NewsSource for News {
        async fn headlines(&self, query: &str, language: &str) -> SourceResult<Vec<NewsItem>>;
    }
}

// ---- Fixtures ----

fn dashboard_config() -> DashboardConfig {
    DashboardConfig {
        cities: vec!["London".to_string(), "Dubai".to_string()],
        cryptos: vec!["bitcoin".to_string(), "ethereum".to_string()],
        news_query: "cryptocurrency".to_string(),
        news_language: "en".to_string(),
        news_limit: 2,
        forecast_days: 3,
        poll_interval_seconds: 60,
    }
}

fn weather(temperature: f64, humidity: f64) -> CurrentWeather {
    CurrentWeather {
        temperature,
        humidity,
        conditions: "Clear".to_string(),
        icon: String::new(),
        feels_like: temperature,
        wind_speed: 5.0,
        last_updated: "2024-03-01 10:00".to_string(),
        is_day: true,
        location: "Somewhere".to_string(),
        fetched_at: Utc::now(),
    }
}

fn market(id: &str, price: f64) -> CoinMarket {
    CoinMarket {
        id: id.to_string(),
        name: id.to_string(),
        symbol: id[..3].to_string(),
        image: String::new(),
        current_price: price,
        price_change_percentage_24h: Some(0.5),
        market_cap: price * 1_000.0,
        market_cap_rank: Some(1),
        total_volume: 10.0,
        last_updated: String::new(),
    }
}

fn headline(id: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: format!("Headline {id}"),
        description: String::new(),
        url: format!("https://news/{id}"),
        source: "wire".to_string(),
        published_at: "2024-03-01 09:00:00".to_string(),
    }
}

fn healthy_weather() -> MockWeather {
    let mut weather_src = MockWeather::new();
    weather_src
        .expect_current()
        .with(eq("London"))
        .returning(|_| Ok(weather(12.0, 60.0)));
    weather_src
        .expect_current()
        .with(eq("Dubai"))
        .returning(|_| Ok(weather(41.0, 85.0)));
    weather_src
}

fn healthy_crypto() -> MockCrypto {
    let mut crypto = MockCrypto::new();
    crypto
        .expect_markets()
        .returning(|_| Ok(vec![market("bitcoin", 64_000.0), market("ethereum", 3_100.0)]));
    crypto
}

fn service(
    weather_src: MockWeather,
    crypto: MockCrypto,
    news: MockNews,
) -> (Arc<DashboardService>, broadcast::Receiver<Alert>) {
    let (alert_tx, alert_rx) = broadcast::channel(64);
    let service = DashboardService::new(
        Arc::new(weather_src),
        Arc::new(crypto),
        Arc::new(news),
        dashboard_config(),
        WeatherThresholds::default(),
        alert_tx,
    );
    (Arc::new(service), alert_rx)
}

// ---- Feed isolation ----

#[tokio::test]
async fn test_failed_feed_does_not_affect_others() {
    let mut news = MockNews::new();
    news.expect_headlines()
        .returning(|_, _| Err(SourceError::MissingApiKey("News")));

    let (dashboard, _alerts) = service(healthy_weather(), healthy_crypto(), news);
    dashboard.refresh_all().await;

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.weather.data.len(), 2);
    assert!(snapshot.weather.error.is_none());
    assert_eq!(snapshot.crypto.data.len(), 2);
    assert!(snapshot.crypto.last_updated.is_some());
    assert!(snapshot.news.data.is_empty());
    assert_eq!(
        snapshot.news.error.as_deref(),
        Some("News API key not configured")
    );
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_data() {
    let mut crypto = MockCrypto::new();
    let mut calls = 0;
    crypto.expect_markets().returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(vec![market("bitcoin", 64_000.0)])
        } else {
            Err(SourceError::Status {
                status: 429,
                message: "rate limited".to_string(),
            })
        }
    });

    let (dashboard, _alerts) = service(MockWeather::new(), crypto, MockNews::new());
    let ids = vec!["bitcoin".to_string()];

    assert!(dashboard.refresh_crypto(&ids).await.is_ok());
    assert!(dashboard.refresh_crypto(&ids).await.is_err());

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.crypto.data["bitcoin"].current_price, 64_000.0);
    assert!(snapshot.crypto.error.is_some());
}

#[tokio::test]
async fn test_weather_error_names_city() {
    let mut weather_src = MockWeather::new();
    weather_src
        .expect_current()
        .returning(|_| Err(SourceError::InvalidPayload("weather")));

    let (dashboard, _alerts) = service(weather_src, MockCrypto::new(), MockNews::new());
    assert!(dashboard.refresh_weather("Oslo").await.is_err());

    let snapshot = dashboard.snapshot().await;
    assert_eq!(
        snapshot.weather.error.as_deref(),
        Some("Oslo: invalid weather data received")
    );
}

#[tokio::test]
async fn test_forecast_and_history_keep_their_own_errors() {
    let mut weather_src = MockWeather::new();
    let mut forecast_calls = 0;
    weather_src
        .expect_forecast()
        .with(eq("Oslo"), eq(3))
        .returning(move |_, _| {
            forecast_calls += 1;
            if forecast_calls == 1 {
                Err(SourceError::NoData("No forecast for Oslo".to_string()))
            } else {
                Ok(Forecast {
                    last_updated: Utc::now(),
                    days: Vec::new(),
                })
            }
        });
    weather_src.expect_history().returning(|_| {
        Err(SourceError::Status {
            status: 503,
            message: "maintenance".to_string(),
        })
    });

    let (dashboard, _alerts) = service(weather_src, MockCrypto::new(), MockNews::new());

    assert!(dashboard.refresh_forecast("Oslo").await.is_err());
    assert!(dashboard.refresh_history("Oslo").await.is_err());
    let snapshot = dashboard.snapshot().await;
    assert_eq!(
        snapshot.forecasts.error.as_deref(),
        Some("Oslo: No forecast for Oslo")
    );
    assert_eq!(
        snapshot.history.error.as_deref(),
        Some("Oslo: upstream returned 503: maintenance")
    );
    assert!(snapshot.weather.error.is_none());

    assert!(dashboard.refresh_forecast("Oslo").await.is_ok());
    let snapshot = dashboard.snapshot().await;
    assert!(snapshot.forecasts.data.contains_key("Oslo"));
    assert!(snapshot.forecasts.error.is_none());
    assert!(snapshot.forecasts.last_updated.is_some());
    assert!(snapshot.history.error.is_some());
}

#[tokio::test]
async fn test_history_stored_per_city() {
    let mut weather_src = MockWeather::new();
    weather_src.expect_history().returning(|city| {
        Ok(HistoricalDay {
            date: format!("2024-02-29 {city}"),
            hourly_data: Vec::new(),
        })
    });

    let (dashboard, _alerts) = service(weather_src, MockCrypto::new(), MockNews::new());
    dashboard.refresh_history("London").await.unwrap();
    dashboard.refresh_history("Dubai").await.unwrap();

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.history.data.len(), 2);
    assert_eq!(snapshot.history.data["Dubai"].date, "2024-02-29 Dubai");
}

#[tokio::test]
async fn test_coin_detail_success_and_failure() {
    let mut crypto = MockCrypto::new();
    crypto.expect_coin().with(eq("dogecoin")).returning(|id| {
        Ok(CoinDetail {
            id: id.to_string(),
            name: "Dogecoin".to_string(),
            symbol: "DOGE".to_string(),
            price: 0.081,
            change_24h: Some(2.5),
            market_cap: 11_600_000_000.0,
            fetched_at: Utc::now(),
        })
    });
    crypto
        .expect_coin()
        .with(eq("nocoin"))
        .returning(|_| Err(SourceError::InvalidPayload("coin")));

    let (dashboard, _alerts) = service(MockWeather::new(), crypto, MockNews::new());

    assert!(dashboard.refresh_coin("dogecoin").await.is_ok());
    assert!(dashboard.refresh_coin("nocoin").await.is_err());

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.coin_details.data["dogecoin"].symbol, "DOGE");
    assert_eq!(
        snapshot.coin_details.error.as_deref(),
        Some("nocoin: invalid coin data received")
    );
    assert!(snapshot.crypto.error.is_none());
}

// ---- Weather alerts ----

#[tokio::test]
async fn test_weather_thresholds_raise_alerts() {
    let (dashboard, mut alerts) = service(healthy_weather(), MockCrypto::new(), MockNews::new());

    assert!(dashboard.refresh_weather("London").await.is_ok());
    assert!(alerts.try_recv().is_err());

    assert!(dashboard.refresh_weather("Dubai").await.is_ok());
    let heat = alerts.try_recv().unwrap();
    let humid = alerts.try_recv().unwrap();
    assert_eq!(heat.kind(), AlertKind::Weather);
    assert_eq!(heat.message(), "Extreme heat in Dubai: 41.0°C");
    assert_eq!(humid.message(), "High humidity in Dubai: 85%");
}

// ---- Live ticks, news, favorites ----

#[tokio::test]
async fn test_apply_tick_updates_known_coin_only() {
    let (dashboard, _alerts) = service(MockWeather::new(), healthy_crypto(), MockNews::new());
    dashboard
        .refresh_crypto(&["bitcoin".to_string(), "ethereum".to_string()])
        .await
        .unwrap();

    let tick = PriceTick {
        asset: "bitcoin".to_string(),
        price: 65_000.0,
        timestamp_ms: 1,
    };
    assert!(dashboard.apply_tick(&tick).await);

    let unknown = PriceTick {
        asset: "solana".to_string(),
        price: 150.0,
        timestamp_ms: 2,
    };
    assert!(!dashboard.apply_tick(&unknown).await);

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.crypto.data["bitcoin"].current_price, 65_000.0);
    assert_eq!(snapshot.crypto.data["ethereum"].current_price, 3_100.0);
}

#[tokio::test]
async fn test_news_limited_in_snapshot() {
    let mut news = MockNews::new();
    news.expect_headlines()
        .with(eq("cryptocurrency"), eq("en"))
        .returning(|_, _| Ok(vec![headline("a"), headline("b"), headline("c")]));

    let (dashboard, _alerts) = service(MockWeather::new(), MockCrypto::new(), news);
    dashboard.refresh_news().await.unwrap();

    let snapshot = dashboard.snapshot().await;
    let ids: Vec<&str> = snapshot.news.data.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_favorite_toggles() {
    let (dashboard, _alerts) = service(MockWeather::new(), MockCrypto::new(), MockNews::new());

    assert!(dashboard.toggle_city_favorite("Tokyo").await);
    assert!(dashboard.toggle_crypto_favorite("bitcoin").await);
    assert!(dashboard.toggle_city_favorite("Berlin").await);
    assert!(!dashboard.toggle_city_favorite("Tokyo").await);
    dashboard.set_crypto_favorite("ethereum", true).await;

    let favorites = dashboard.favorites().await;
    assert_eq!(favorites.cities, vec!["Berlin"]);
    assert_eq!(favorites.cryptos, vec!["bitcoin", "ethereum"]);
}

#[tokio::test]
async fn test_run_mirrors_connection_and_ticks() {
    let (dashboard, _alerts) = service(healthy_weather(), healthy_crypto(), {
        let mut news = MockNews::new();
        news.expect_headlines().returning(|_, _| Ok(Vec::new()));
        news
    });
    let (price_tx, price_rx) = broadcast::channel(16);
    let (connected_tx, connected_rx) = watch::channel(false);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let runner = Arc::clone(&dashboard);
    let handle =
        tokio::spawn(async move { runner.run(price_rx, connected_rx, shutdown_rx).await });

    // first interval tick refreshes immediately
    tokio::time::sleep(Duration::from_millis(50)).await;
    connected_tx.send_replace(true);
    price_tx
        .send(PriceTick {
            asset: "ethereum".to_string(),
            price: 3_200.0,
            timestamp_ms: 3,
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = dashboard.snapshot().await;
    assert!(snapshot.live);
    assert_eq!(snapshot.crypto.data["ethereum"].current_price, 3_200.0);

    shutdown_tx.send(()).unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(matches!(finished, Ok(Ok(Ok(())))));
}

/// News source that answers only after a delay.
struct SlowNews(Duration);

#[async_trait::async_trait]
impl NewsSource for SlowNews {
    async fn headlines(&self, _query: &str, _language: &str) -> SourceResult<Vec<NewsItem>> {
        tokio::time::sleep(self.0).await;
        Ok(vec![headline("late")])
    }
}

#[tokio::test]
async fn test_run_merges_ticks_while_refresh_in_flight() {
    let (alert_tx, _alerts) = broadcast::channel(64);
    let dashboard = Arc::new(DashboardService::new(
        Arc::new(healthy_weather()),
        Arc::new(healthy_crypto()),
        Arc::new(SlowNews(Duration::from_secs(2))),
        dashboard_config(),
        WeatherThresholds::default(),
        alert_tx,
    ));
    let (price_tx, price_rx) = broadcast::channel(16);
    let (connected_tx, connected_rx) = watch::channel(false);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let runner = Arc::clone(&dashboard);
    let handle =
        tokio::spawn(async move { runner.run(price_rx, connected_rx, shutdown_rx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    connected_tx.send_replace(true);
    price_tx
        .send(PriceTick {
            asset: "bitcoin".to_string(),
            price: 66_000.0,
            timestamp_ms: 4,
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = dashboard.snapshot().await;
    // news is still being fetched
    assert!(snapshot.news.last_updated.is_none());
    assert!(snapshot.live);
    assert_eq!(snapshot.crypto.data["bitcoin"].current_price, 66_000.0);

    shutdown_tx.send(()).unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(matches!(finished, Ok(Ok(Ok(())))));
}

// ---- Alert center ----

#[tokio::test]
async fn test_alert_center_collects_and_removes() {
    let center = AlertCenter::new();
    let (alert_tx, alert_rx) = broadcast::channel(16);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let runner = center.clone();
    let handle = tokio::spawn(async move { runner.run(alert_rx, shutdown_rx).await });

    let first = Alert::price("BITCOIN price has increased by 1.00%");
    let first_id = first.id();
    alert_tx.send(first).unwrap();
    alert_tx
        .send(Alert::weather("Freezing temperature in Oslo: -4.0°C"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(center.len().await, 2);
    assert!(center.remove(first_id).await);
    assert!(!center.remove(first_id).await);
    assert_eq!(center.alerts().await.len(), 1);

    center.clear().await;
    assert_eq!(center.len().await, 0);

    shutdown_tx.send(()).unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
}

// ---- HTTP API ----

#[tokio::test]
async fn test_api_routes() {
    let (dashboard, _alerts) = service(MockWeather::new(), MockCrypto::new(), MockNews::new());
    let alerts = AlertCenter::new();
    alerts.record(Alert::price("DOGECOIN price has decreased by 2.00%")).await;
    let (_connected_tx, connected_rx) = watch::channel(false);

    let app = router(
        ApiState {
            dashboard: Arc::clone(&dashboard),
            alerts: alerts.clone(),
        },
        HealthState::new(connected_rx),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let http = reqwest::Client::new();

    let response = http.get(format!("{base}/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["live"], serde_json::Value::Bool(false));

    let response = http
        .post(format!("{base}/favorites/cities/Paris"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isFavorite"], serde_json::Value::Bool(true));
    assert_eq!(dashboard.favorites().await.cities, vec!["Paris"]);

    let response = http.get(format!("{base}/ready")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let body: Vec<serde_json::Value> = http
        .get(format!("{base}/alerts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.len(), 1);

    let missing = format!("{base}/alerts/{}", uuid::Uuid::new_v4());
    let response = http.delete(missing).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = http.delete(format!("{base}/alerts")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(alerts.len().await, 0);

    server.abort();
}

#[tokio::test]
async fn test_api_refresh_error_statuses() {
    let mut crypto = MockCrypto::new();
    crypto
        .expect_coin()
        .with(eq("bad id"))
        .returning(|id| Err(SourceError::InvalidRequest(format!("coin id {id:?}"))));
    crypto
        .expect_coin()
        .with(eq("bitcoin"))
        .returning(|_| Err(SourceError::Transport("timed out".to_string())));
    let (dashboard, _alerts) = service(MockWeather::new(), crypto, MockNews::new());
    let (_connected_tx, connected_rx) = watch::channel(false);

    let app = router(
        ApiState {
            dashboard,
            alerts: AlertCenter::new(),
        },
        HealthState::new(connected_rx),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/crypto/bad%20id/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = http
        .post(format!("{base}/crypto/bitcoin/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "request failed: timed out");

    server.abort();
}
