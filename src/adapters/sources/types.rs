//! Upstream response types.
//!
//! Raw shapes of the WeatherAPI, CoinGecko and NewsData payloads, with
//! just enough structure to normalize into domain entities. Optional
//! fields stay optional here; normalization decides the fallbacks.

use serde::Deserialize;

// ── WeatherAPI ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WeatherCondition {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub temp_c: f64,
    pub humidity: f64,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub feelslike_c: Option<f64>,
    #[serde(default)]
    pub wind_kph: Option<f64>,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub is_day: u8,
}

#[derive(Debug, Deserialize)]
pub struct HourResponse {
    pub time: String,
    pub temp_c: f64,
    pub humidity: f64,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub chance_of_rain: Option<f64>,
    #[serde(default)]
    pub chance_of_snow: Option<f64>,
}

/// Day aggregate. Every field is optional so one malformed day can be
/// replaced by a placeholder instead of failing the whole forecast.
#[derive(Debug, Deserialize)]
pub struct DayResponse {
    pub maxtemp_c: Option<f64>,
    pub mintemp_c: Option<f64>,
    pub avgtemp_c: Option<f64>,
    pub avghumidity: Option<f64>,
    pub condition: Option<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastDayResponse {
    pub date: String,
    pub day: Option<DayResponse>,
    #[serde(default)]
    pub hour: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastBlock {
    pub forecastday: Vec<ForecastDayResponse>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiResponse {
    pub location: Option<WeatherLocation>,
    pub current: Option<CurrentResponse>,
    pub forecast: Option<ForecastBlock>,
}

// ── CoinGecko ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MarketRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsdAmount {
    pub usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CoinMarketData {
    pub current_price: UsdAmount,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: UsdAmount,
}

#[derive(Debug, Deserialize)]
pub struct CoinResponse {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_data: CoinMarketData,
}

// ── NewsData ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewsArticle {
    pub article_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub results: Option<Vec<NewsArticle>>,
}
