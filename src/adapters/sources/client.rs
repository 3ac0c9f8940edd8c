//! Upstream HTTP Client - Rate-limited REST Client
//!
//! Wraps reqwest with rate limiting, bounded concurrency and retries
//! for every weather, crypto and news API call. One client per
//! upstream host.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::ports::sources::{SourceError, SourceResult};

/// Configuration for one upstream HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
  /// Base URL, without trailing slash.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Requests per minute allowed.
  pub requests_per_minute: u32,
}

impl Default for HttpClientConfig {
  fn default() -> Self {
    Self {
      base_url: String::new(),
      timeout: Duration::from_secs(10),
      max_concurrent: 4,
      max_retries: 2,
      retry_base_delay: Duration::from_millis(250),
      requests_per_minute: 30,
    }
  }
}

impl HttpClientConfig {
  /// Client settings for `base_url` using the shared API section.
  pub fn for_base(base_url: &str, api: &ApiConfig) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_secs(api.timeout_seconds),
      max_retries: api.max_retries,
      requests_per_minute: api.requests_per_minute,
      ..Self::default()
    }
  }
}

/// Rate-limited JSON-over-HTTP client.
pub struct HttpClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: HttpClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Request-rate limiter.
  limiter: DefaultDirectRateLimiter,
}

impl HttpClient {
  /// Create a new client.
  pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(2)
      .user_agent(concat!("cryptoweather-nexus/", env!("CARGO_PKG_VERSION")))
      .build()?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

    Ok(Self {
      http,
      config,
      semaphore,
      limiter,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// GET `path` with query parameters and decode the JSON body.
  ///
  /// `what` names the payload in `InvalidPayload` errors.
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    what: &'static str,
    path: &str,
    query: &[(&str, String)],
  ) -> SourceResult<T> {
    let body = self.get_with_retry(path, query).await?;
    serde_json::from_str(&body).map_err(|e| {
      debug!(error = %e, payload = what, "Failed to decode upstream JSON");
      SourceError::InvalidPayload(what)
    })
  }

  /// Execute a GET with rate limiting and retries; returns the body text.
  async fn get_with_retry(&self, path: &str, query: &[(&str, String)]) -> SourceResult<String> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| SourceError::Transport("client shut down".to_string()))?;

    let url = format!("{}{}", self.config.base_url, path);
    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      match self.http.get(&url).query(query).send().await {
        Ok(response) => {
          let status = response.status();
          match status {
            s if s.is_success() => return Ok(response.text().await?),
            StatusCode::TOO_MANY_REQUESTS => {
              warn!(path, "Rate limited by upstream, backing off");
              last_error = Some(SourceError::Status {
                status: status.as_u16(),
                message: "rate limited".to_string(),
              });
            }
            s if s.is_server_error() => {
              warn!(path, status = %s, "Server error, retrying");
              last_error = Some(SourceError::Status {
                status: s.as_u16(),
                message: s.canonical_reason().unwrap_or("server error").to_string(),
              });
            }
            s => {
              let body = response.text().await.unwrap_or_default();
              return Err(SourceError::Status {
                status: s.as_u16(),
                message: error_message(&body),
              });
            }
          }
        }
        Err(e) => {
          warn!(path, error = %e, attempt, "Request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(last_error.unwrap_or_else(|| SourceError::Transport("max retries exceeded".to_string())))
  }
}

/// Pull a readable message out of an upstream error body.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}`,
/// `{"message":".."}` and `{"results":{"message":..}}`; otherwise
/// returns the body, truncated.
pub fn error_message(body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
    let candidates = [
      value.pointer("/error/message"),
      value.get("error"),
      value.get("message"),
      value.pointer("/results/message"),
      value.pointer("/status/error_message"),
    ];
    if let Some(text) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
      return text.to_string();
    }
  }
  body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_message_shapes() {
    assert_eq!(
      error_message(r#"{"error":{"code":1006,"message":"No matching location found."}}"#),
      "No matching location found."
    );
    assert_eq!(error_message(r#"{"error":"coin not found"}"#), "coin not found");
    assert_eq!(
      error_message(r#"{"status":"error","results":{"message":"API key is invalid"}}"#),
      "API key is invalid"
    );
    assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
  }

  #[test]
  fn test_for_base_trims_slash() {
    let api: ApiConfig = toml::from_str("").unwrap();
    let config = HttpClientConfig::for_base("https://example.com/v1/", &api);
    assert_eq!(config.base_url, "https://example.com/v1");
    assert_eq!(config.timeout, Duration::from_secs(10));
  }
}
