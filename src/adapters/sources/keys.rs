//! Upstream API keys.
//!
//! Keys are read from the environment only. A missing key is not a
//! startup error: the affected feed reports "API key not configured"
//! on every fetch and the rest of the dashboard keeps working.

use tracing::warn;

/// Env vars checked for the weather key, in order.
const WEATHER_KEY_VARS: [&str; 2] = ["WEATHER_API_KEY", "OPENWEATHER_API_KEY"];

/// Env var for the news key.
const NEWS_KEY_VAR: &str = "NEWSDATA_API_KEY";

/// API keys for the keyed providers.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub weather: Option<String>,
    pub news: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("weather", &self.weather.as_ref().map(|_| "<redacted>"))
            .field("news", &self.news.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiKeys {
    /// Load keys from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load keys through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let weather = WEATHER_KEY_VARS.iter().find_map(|name| non_empty(name));
        let news = non_empty(NEWS_KEY_VAR);

        if weather.is_none() {
            warn!("No weather API key set ({})", WEATHER_KEY_VARS.join(" / "));
        }
        if news.is_none() {
            warn!("No news API key set ({NEWS_KEY_VAR})");
        }

        Self { weather, news }
    }
}
