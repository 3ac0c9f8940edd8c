//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    assets = config.feed.assets.len(),
    cities = config.dashboard.cities.len(),
    cryptos = config.dashboard.cryptos.len(),
    threshold_pct = config.feed.alert_threshold_pct,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty asset, city and coin lists
/// - Positive thresholds and intervals
/// - A cold threshold below the hot threshold
/// - Non-empty endpoint URLs
fn validate_config(config: &AppConfig) -> Result<()> {
  // Feed validation
  anyhow::ensure!(
    !config.feed.assets.is_empty(),
    "At least one feed asset must be configured"
  );
  for (i, asset) in config.feed.assets.iter().enumerate() {
    anyhow::ensure!(!asset.trim().is_empty(), "Feed asset {} is empty", i);
  }
  anyhow::ensure!(
    !config.feed.ws_url.is_empty(),
    "WebSocket URL must not be empty"
  );
  anyhow::ensure!(
    config.feed.alert_threshold_pct > 0.0,
    "alert_threshold_pct must be positive, got {}",
    config.feed.alert_threshold_pct
  );
  anyhow::ensure!(
    config.feed.reconnect_base_ms > 0,
    "reconnect_base_ms must be positive"
  );
  anyhow::ensure!(
    config.feed.reconnect_max_ms >= config.feed.reconnect_base_ms,
    "reconnect_max_ms ({}) must be >= reconnect_base_ms ({})",
    config.feed.reconnect_max_ms,
    config.feed.reconnect_base_ms
  );
  anyhow::ensure!(
    config.feed.reconnect_max_attempts > 0,
    "reconnect_max_attempts must be positive"
  );
  anyhow::ensure!(
    (0.0..1.0).contains(&config.feed.jitter_factor),
    "jitter_factor must be in [0, 1), got {}",
    config.feed.jitter_factor
  );
  anyhow::ensure!(
    config.feed.event_buffer > 0,
    "event_buffer must be positive"
  );

  // Threshold validation
  anyhow::ensure!(
    config.thresholds.cold_celsius < config.thresholds.hot_celsius,
    "cold_celsius ({}) must be below hot_celsius ({})",
    config.thresholds.cold_celsius,
    config.thresholds.hot_celsius
  );
  anyhow::ensure!(
    config.thresholds.humidity_pct > 0.0 && config.thresholds.humidity_pct <= 100.0,
    "humidity_pct must be in (0, 100], got {}",
    config.thresholds.humidity_pct
  );

  // Dashboard validation
  anyhow::ensure!(
    !config.dashboard.cities.is_empty(),
    "At least one city must be configured"
  );
  anyhow::ensure!(
    !config.dashboard.cryptos.is_empty(),
    "At least one crypto id must be configured"
  );
  anyhow::ensure!(
    config.dashboard.poll_interval_seconds > 0,
    "poll_interval_seconds must be positive"
  );
  anyhow::ensure!(
    (1..=14).contains(&config.dashboard.forecast_days),
    "forecast_days must be in [1, 14], got {}",
    config.dashboard.forecast_days
  );

  // API validation
  anyhow::ensure!(
    !config.api.weather_url.is_empty()
      && !config.api.crypto_url.is_empty()
      && !config.api.news_url.is_empty(),
    "API base URLs must not be empty"
  );
  anyhow::ensure!(
    config.api.requests_per_minute > 0,
    "requests_per_minute must be positive"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
[app]
name = "nexus"

[feed]
assets = ["bitcoin", "ethereum", "dogecoin"]

[dashboard]
cities = ["New York", "London", "Tokyo"]
cryptos = ["bitcoin", "ethereum", "dogecoin"]

[api]
"#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_fills_defaults() {
    let config = parse_config(MINIMAL).unwrap();
    assert_eq!(config.feed.alert_threshold_pct, 1.0);
    assert_eq!(config.feed.reconnect_base_ms, 5_000);
    assert_eq!(config.thresholds.hot_celsius, 35.0);
    assert_eq!(config.thresholds.cold_celsius, 0.0);
    assert_eq!(config.thresholds.humidity_pct, 80.0);
    assert_eq!(config.dashboard.poll_interval_seconds, 60);
    assert_eq!(config.dashboard.news_limit, 5);
    assert_eq!(config.api.weather_url, "https://api.weatherapi.com/v1");
    assert!(config.server.metrics_enabled);
  }

  #[test]
  fn test_rejects_empty_assets() {
    let text = MINIMAL.replace(
      r#"assets = ["bitcoin", "ethereum", "dogecoin"]"#,
      "assets = []",
    );
    let err = parse_config(&text).unwrap_err();
    assert!(err.to_string().contains("feed asset"));
  }

  #[test]
  fn test_rejects_inverted_temperature_thresholds() {
    let text = format!("{MINIMAL}\n[thresholds]\nhot_celsius = -5.0\n");
    assert!(parse_config(&text).is_err());
  }

  #[test]
  fn test_reconnect_policy_from_config() {
    let config = parse_config(MINIMAL).unwrap();
    let policy = config.feed.reconnect_policy();
    assert_eq!(policy.base_delay.as_millis(), 5_000);
    assert_eq!(policy.max_delay.as_millis(), 60_000);
    assert_eq!(policy.max_attempts, 10);
  }
}
