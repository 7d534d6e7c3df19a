use crate::data::{ExchangeInfo, GlobalMarket, TrendingCoin};
use crate::error::{SourceError, SourceResult};
use crate::exchange::coingecko::types::{
    CoinMarket, ExchangeEntry, GlobalResponse, MarketChart, TrendingResponse,
};
use crate::exchange::retry::RetryPolicy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko public REST API client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    /// Create new REST client
    ///
    /// Fails if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, api_key: Option<String>, retry: RetryPolicy) -> SourceResult<Self> {
        Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("token_flow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            retry,
        })
    }

    /// Top coins by market cap, with 1h / 24h / 7d price changes
    pub async fn get_markets(&self, limit: usize) -> SourceResult<Vec<CoinMarket>> {
        let query = [
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", limit.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "1h,24h,7d".to_string()),
        ];

        let coins: Vec<CoinMarket> = self.get_json("/coins/markets", &query).await?;
        info!("Fetched {} coins from CoinGecko", coins.len());

        Ok(coins)
    }

    /// Global market overview
    pub async fn get_global(&self) -> SourceResult<GlobalMarket> {
        let response: GlobalResponse = self.get_json("/global", &[]).await?;
        Ok(response.data.to_global_market())
    }

    /// Trending coins from search
    pub async fn get_trending(&self) -> SourceResult<Vec<TrendingCoin>> {
        let response: TrendingResponse = self.get_json("/search/trending", &[]).await?;
        Ok(response
            .coins
            .iter()
            .map(|entry| entry.item.to_trending_coin())
            .collect())
    }

    /// Spot exchanges ranked by trust score
    pub async fn get_exchanges(&self, limit: usize) -> SourceResult<Vec<ExchangeInfo>> {
        let query = [("per_page", limit.to_string()), ("page", "1".to_string())];

        let entries: Vec<ExchangeEntry> = self.get_json("/exchanges", &query).await?;
        info!("Fetched {} exchanges from CoinGecko", entries.len());

        Ok(entries.iter().map(|entry| entry.to_exchange_info()).collect())
    }

    /// Daily price and volume history for one coin
    pub async fn get_market_chart(&self, coin_id: &str, days: u32) -> SourceResult<MarketChart> {
        if coin_id.is_empty() || coin_id.contains('/') {
            return Err(SourceError::Config(format!("invalid coin id: {:?}", coin_id)));
        }

        let query = [
            ("vs_currency", "usd".to_string()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];

        self.get_json(&format!("/coins/{}/market_chart", coin_id), &query).await
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self
            .retry
            .send(|| {
                let request = self.client.get(&url).query(query);
                match &self.api_key {
                    Some(key) => request.header(API_KEY_HEADER, key),
                    None => request,
                }
            })
            .await?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
