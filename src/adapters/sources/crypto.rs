//! CoinGecko adapter - markets listing and coin detail.

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::client::HttpClient;
use super::types::{CoinResponse, MarketRow};
use crate::domain::market::{CoinDetail, CoinId, CoinMarket};
use crate::ports::sources::{CryptoSource, SourceError, SourceResult};

/// `CryptoSource` backed by the public CoinGecko API (no key).
pub struct CoinGeckoClient {
    client: HttpClient,
}

impl CoinGeckoClient {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CryptoSource for CoinGeckoClient {
    #[instrument(skip(self))]
    async fn markets(&self, ids: &[CoinId]) -> SourceResult<Vec<CoinMarket>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("vs_currency", "usd".to_string()),
            ("ids", ids.join(",")),
            ("order", "market_cap_desc".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let rows: Vec<MarketRow> = self
            .client
            .get_json("crypto", "/coins/markets", &query)
            .await?;
        Ok(rows.into_iter().map(normalize_market).collect())
    }

    #[instrument(skip(self))]
    async fn coin(&self, id: &str) -> SourceResult<CoinDetail> {
        if !is_valid_coin_id(id) {
            return Err(SourceError::InvalidRequest(format!("coin id {id:?}")));
        }
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let path = format!("/coins/{id}");
        let response: CoinResponse = self.client.get_json("coin", &path, &query).await?;
        normalize_coin(response)
    }
}

/// CoinGecko ids are lowercase ASCII letters, digits and hyphens.
pub fn is_valid_coin_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Map one markets row; missing numbers become zero.
pub fn normalize_market(row: MarketRow) -> CoinMarket {
    CoinMarket {
        id: row.id,
        name: row.name,
        symbol: row.symbol,
        image: row.image.unwrap_or_default(),
        current_price: row.current_price.unwrap_or_default(),
        price_change_percentage_24h: row.price_change_percentage_24h,
        market_cap: row.market_cap.unwrap_or_default(),
        market_cap_rank: row.market_cap_rank,
        total_volume: row.total_volume.unwrap_or_default(),
        last_updated: row.last_updated.unwrap_or_default(),
    }
}

/// Map a coin detail response. A coin without a USD price is invalid.
pub fn normalize_coin(response: CoinResponse) -> SourceResult<CoinDetail> {
    let price = response
        .market_data
        .current_price
        .usd
        .ok_or(SourceError::InvalidPayload("coin"))?;

    Ok(CoinDetail {
        id: response.id,
        name: response.name,
        symbol: response.symbol.to_uppercase(),
        price,
        change_24h: response.market_data.price_change_percentage_24h,
        market_cap: response.market_data.market_cap.usd.unwrap_or_default(),
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sources::client::HttpClientConfig;

    #[test]
    fn test_normalize_market_row() {
        let rows: Vec<MarketRow> = serde_json::from_str(
            r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
                 "image": "https://img/btc.png", "current_price": 64123.5,
                 "market_cap": 1260000000000, "market_cap_rank": 1,
                 "total_volume": 31000000000, "price_change_percentage_24h": -1.2,
                 "last_updated": "2024-03-01T10:00:00.000Z"},
                {"id": "newcoin", "symbol": "new", "name": "New",
                 "current_price": null, "market_cap": null, "market_cap_rank": null,
                 "total_volume": null, "price_change_percentage_24h": null}]"#,
        )
        .unwrap();
        let markets: Vec<CoinMarket> = rows.into_iter().map(normalize_market).collect();

        assert_eq!(markets[0].current_price, 64123.5);
        assert_eq!(markets[0].market_cap_rank, Some(1));
        assert_eq!(markets[0].price_change_percentage_24h, Some(-1.2));
        assert_eq!(markets[1].current_price, 0.0);
        assert_eq!(markets[1].image, "");
    }

    #[test]
    fn test_normalize_coin_uppercases_symbol() {
        let response: CoinResponse = serde_json::from_str(
            r#"{"id": "dogecoin", "symbol": "doge", "name": "Dogecoin",
                "market_data": {"current_price": {"usd": 0.081, "eur": 0.075},
                                "price_change_percentage_24h": 2.5,
                                "market_cap": {"usd": 11600000000}}}"#,
        )
        .unwrap();
        let coin = normalize_coin(response).unwrap();
        assert_eq!(coin.symbol, "DOGE");
        assert_eq!(coin.price, 0.081);
        assert_eq!(coin.market_cap, 11_600_000_000.0);
    }

    #[test]
    fn test_coin_id_validation() {
        assert!(is_valid_coin_id("bitcoin"));
        assert!(is_valid_coin_id("usd-coin"));
        assert!(is_valid_coin_id("0x"));
        assert!(!is_valid_coin_id(""));
        assert!(!is_valid_coin_id("../something"));
        assert!(!is_valid_coin_id("bitcoin?x=1"));
        assert!(!is_valid_coin_id("Bitcoin"));
    }

    #[tokio::test]
    async fn test_coin_rejects_path_segments() {
        let client = HttpClient::new(HttpClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..HttpClientConfig::default()
        })
        .unwrap();
        let gecko = CoinGeckoClient::new(client);

        let err = gecko.coin("../something").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }

    #[test]
    fn test_coin_without_usd_price() {
        let response: CoinResponse = serde_json::from_str(
            r#"{"id": "x", "symbol": "x", "name": "X",
                "market_data": {"current_price": {}, "market_cap": {}}}"#,
        )
        .unwrap();
        assert!(normalize_coin(response).is_err());
    }
}
