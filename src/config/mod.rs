//! Configuration Module - TOML-based Dashboard Configuration
//!
//! Loads and validates configuration from `config.toml`. API keys are
//! never stored here; they come from environment variables (see
//! `adapters::sources::keys`). Every alert threshold and polling
//! interval is externalized here - nothing is hardcoded in the
//! domain layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::backoff::ReconnectPolicy;
use crate::domain::weather::WeatherThresholds;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any feed is started.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub app: AppSection,
  /// Live price feed (push channel) settings.
  pub feed: FeedConfig,
  /// Weather condition alert thresholds.
  #[serde(default)]
  pub thresholds: ThresholdConfig,
  /// Tracked cities, coins and news query.
  pub dashboard: DashboardConfig,
  /// Upstream REST API endpoints.
  pub api: ApiConfig,
  /// Inbound HTTP surface.
  #[serde(default)]
  pub server: ServerConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Push-price feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// WebSocket base URL; the asset list is appended as `?assets=`.
  #[serde(default = "default_ws_url")]
  pub ws_url: String,
  /// Asset identifiers to subscribe to (fixed for the process lifetime).
  pub assets: Vec<String>,
  /// Minimum absolute percentage move between ticks that raises an alert.
  #[serde(default = "default_alert_threshold_pct")]
  pub alert_threshold_pct: f64,
  /// First reconnect delay (milliseconds).
  #[serde(default = "default_reconnect_base_ms")]
  pub reconnect_base_ms: u64,
  /// Reconnect delay ceiling (milliseconds).
  #[serde(default = "default_reconnect_max_ms")]
  pub reconnect_max_ms: u64,
  /// Consecutive failed attempts before the monitor gives up.
  #[serde(default = "default_reconnect_max_attempts")]
  pub reconnect_max_attempts: u32,
  /// Jitter applied to each delay, as a fraction of it.
  #[serde(default = "default_jitter_factor")]
  pub jitter_factor: f64,
  /// Broadcast buffer for ticks and alerts.
  #[serde(default = "default_event_buffer")]
  pub event_buffer: usize,
}

impl FeedConfig {
  /// Build the reconnect policy described by this section.
  pub fn reconnect_policy(&self) -> ReconnectPolicy {
    ReconnectPolicy {
      base_delay: Duration::from_millis(self.reconnect_base_ms),
      max_delay: Duration::from_millis(self.reconnect_max_ms),
      max_attempts: self.reconnect_max_attempts,
      jitter_factor: self.jitter_factor,
    }
  }
}

/// Weather alert thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
  /// Temperature at or above which a heat alert fires (°C).
  #[serde(default = "default_hot_celsius")]
  pub hot_celsius: f64,
  /// Temperature at or below which a cold alert fires (°C).
  #[serde(default = "default_cold_celsius")]
  pub cold_celsius: f64,
  /// Relative humidity at or above which a humidity alert fires (%).
  #[serde(default = "default_humidity_pct")]
  pub humidity_pct: f64,
}

impl Default for ThresholdConfig {
  fn default() -> Self {
    Self {
      hot_celsius: default_hot_celsius(),
      cold_celsius: default_cold_celsius(),
      humidity_pct: default_humidity_pct(),
    }
  }
}

impl From<&ThresholdConfig> for WeatherThresholds {
  fn from(config: &ThresholdConfig) -> Self {
    Self {
      hot_celsius: config.hot_celsius,
      cold_celsius: config.cold_celsius,
      humidity_pct: config.humidity_pct,
    }
  }
}

/// What the dashboard tracks.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
  /// Cities shown in the weather section.
  pub cities: Vec<String>,
  /// CoinGecko coin ids shown in the crypto section.
  pub cryptos: Vec<String>,
  /// News search query.
  #[serde(default = "default_news_query")]
  pub news_query: String,
  /// News language filter.
  #[serde(default = "default_news_language")]
  pub news_language: String,
  /// Number of headlines kept in the snapshot.
  #[serde(default = "default_news_limit")]
  pub news_limit: usize,
  /// Days requested from the forecast endpoint.
  #[serde(default = "default_forecast_days")]
  pub forecast_days: u32,
  /// Interval between full refreshes (seconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
}

/// Upstream REST API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// WeatherAPI base URL.
  #[serde(default = "default_weather_url")]
  pub weather_url: String,
  /// CoinGecko base URL.
  #[serde(default = "default_crypto_url")]
  pub crypto_url: String,
  /// NewsData base URL.
  #[serde(default = "default_news_url")]
  pub news_url: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Retries on transient upstream errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Requests per minute allowed per upstream host.
  #[serde(default = "default_requests_per_minute")]
  pub requests_per_minute: u32,
}

/// Inbound HTTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Dashboard API + health probes bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub metrics_enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub metrics_address: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
      metrics_enabled: true,
      metrics_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_ws_url() -> String {
  "wss://ws.coincap.io/prices".to_string()
}

fn default_alert_threshold_pct() -> f64 {
  1.0
}

fn default_reconnect_base_ms() -> u64 {
  5_000
}

fn default_reconnect_max_ms() -> u64 {
  60_000
}

fn default_reconnect_max_attempts() -> u32 {
  10
}

fn default_jitter_factor() -> f64 {
  0.2
}

fn default_event_buffer() -> usize {
  1024
}

fn default_hot_celsius() -> f64 {
  35.0
}

fn default_cold_celsius() -> f64 {
  0.0
}

fn default_humidity_pct() -> f64 {
  80.0
}

fn default_news_query() -> String {
  "cryptocurrency".to_string()
}

fn default_news_language() -> String {
  "en".to_string()
}

fn default_news_limit() -> usize {
  5
}

fn default_forecast_days() -> u32 {
  7
}

fn default_poll_interval() -> u64 {
  60
}

fn default_weather_url() -> String {
  "https://api.weatherapi.com/v1".to_string()
}

fn default_crypto_url() -> String {
  "https://api.coingecko.com/api/v3".to_string()
}

fn default_news_url() -> String {
  "https://newsdata.io/api/1".to_string()
}

fn default_timeout() -> u64 {
  10
}

fn default_max_retries() -> u32 {
  2
}

fn default_requests_per_minute() -> u32 {
  30
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
