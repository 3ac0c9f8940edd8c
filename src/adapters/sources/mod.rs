//! Upstream REST Data Sources
//!
//! Implements the source ports against the public provider APIs.
//!
//! Sub-modules:
//! - `client`: HTTP client with rate limiting and retries
//! - `keys`: API keys from the environment
//! - `types`: Raw provider response types
//! - `weather`: WeatherAPI (current, forecast, history)
//! - `crypto`: CoinGecko (markets, coin detail)
//! - `news`: NewsData (headlines)

pub mod client;
pub mod crypto;
pub mod keys;
pub mod news;
pub mod types;
pub mod weather;

pub use client::{HttpClient, HttpClientConfig};
pub use crypto::CoinGeckoClient;
pub use keys::ApiKeys;
pub use news::NewsDataClient;
pub use weather::WeatherApiClient;
