//! Domain layer - Core dashboard models and pure logic.
//!
//! No I/O here (hexagonal architecture inner ring). Price tracking,
//! threshold checks and the reconnect schedule are all testable in
//! isolation.

pub mod alert;
pub mod backoff;
pub mod favorites;
pub mod market;
pub mod price;
pub mod weather;

// Re-export core types for convenience
pub use alert::{Alert, AlertBook, AlertKind};
pub use backoff::ReconnectPolicy;
pub use favorites::Favorites;
pub use market::{CoinDetail, CoinId, CoinMarket, NewsItem};
pub use price::{AssetId, PriceMove, PriceTick, PriceTracker};
pub use weather::{
    CurrentWeather, DailyForecast, Forecast, HistoricalDay, HourlyData, WeatherThresholds,
};
