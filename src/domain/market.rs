//! Crypto market and news entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::price::PriceTick;

/// CoinGecko coin identifier (e.g. "bitcoin").
pub type CoinId = String;

/// One row of the markets listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: CoinId,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub current_price: f64,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub total_volume: f64,
    pub last_updated: String,
}

impl CoinMarket {
    /// Overwrite the current price with a live tick for the same asset.
    ///
    /// Returns whether the tick applied.
    pub fn apply_tick(&mut self, tick: &PriceTick) -> bool {
        if tick.asset != self.id || !tick.price.is_finite() {
            return false;
        }
        self.current_price = tick.price;
        true
    }
}

/// Detail view for a single coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDetail {
    pub id: CoinId,
    pub name: String,
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// USD price.
    pub price: f64,
    pub change_24h: Option<f64>,
    /// USD market capitalization.
    pub market_cap: f64,
    pub fetched_at: DateTime<Utc>,
}

/// One news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(id: &str, price: f64) -> CoinMarket {
        CoinMarket {
            id: id.to_string(),
            name: id.to_string(),
            symbol: "x".to_string(),
            image: String::new(),
            current_price: price,
            price_change_percentage_24h: None,
            market_cap: 0.0,
            market_cap_rank: None,
            total_volume: 0.0,
            last_updated: String::new(),
        }
    }

    #[test]
    fn test_apply_tick_matches_id() {
        let mut m = market("bitcoin", 100.0);
        let tick = PriceTick {
            asset: "bitcoin".to_string(),
            price: 101.5,
            timestamp_ms: 0,
        };
        assert!(m.apply_tick(&tick));
        assert_eq!(m.current_price, 101.5);

        let other = PriceTick {
            asset: "ethereum".to_string(),
            ..tick
        };
        assert!(!m.apply_tick(&other));
        assert_eq!(m.current_price, 101.5);
    }
}
