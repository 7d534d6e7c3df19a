use crate::error::{SourceError, SourceResult};
use crate::exchange::binance::types::{parse_kline_closes, Ticker24h};
use crate::exchange::retry::RetryPolicy;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance spot public REST API client
///
/// Only unauthenticated market data endpoints are used.
pub struct BinanceRestClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl BinanceRestClient {
    /// Create new REST client
    pub fn new(base_url: &str, retry: RetryPolicy) -> SourceResult<Self> {
        Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// 24hr rolling window statistics for one symbol
    pub async fn get_24hr_ticker(&self, symbol: &str) -> SourceResult<Ticker24h> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        debug!("Fetching 24hr ticker for {}", symbol);

        let response = self
            .retry
            .send(|| self.client.get(&url).query(&[("symbol", symbol)]))
            .await?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Close prices of the last `limit` klines, oldest first
    ///
    /// # Arguments
    /// * `symbol` - Trading pair (e.g. "BTCUSDT")
    /// * `interval` - Kline interval (e.g. "1d")
    /// * `limit` - Number of klines (1-1000)
    pub async fn get_closes(&self, symbol: &str, interval: &str, limit: u32) -> SourceResult<Vec<f64>> {
        if !(1..=1000).contains(&limit) {
            return Err(SourceError::Config(format!("kline limit out of range: {}", limit)));
        }

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();

        let response = self
            .retry
            .send(|| {
                self.client.get(&url).query(&[
                    ("symbol", symbol),
                    ("interval", interval),
                    ("limit", limit.as_str()),
                ])
            })
            .await?;

        let body = response.text().await?;
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(&body)?;
        let closes = parse_kline_closes(&rows);

        info!("Fetched {} {} closes for {}", closes.len(), interval, symbol);
        Ok(closes)
    }

    /// Test connectivity to Binance API
    pub async fn test_connectivity(&self) -> SourceResult<()> {
        let url = format!("{}/api/v3/ping", self.base_url);
        self.retry.send(|| self.client.get(&url)).await?;
        Ok(())
    }
}
