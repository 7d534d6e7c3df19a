pub mod retry;
pub mod coingecko;
pub mod binance;
pub mod demo;

pub use retry::RetryPolicy;
pub use coingecko::CoinGeckoClient;
pub use binance::BinanceRestClient;
pub use demo::DemoSource;

use crate::data::{ExchangeTicker, TokenSnapshot};
use crate::error::SourceResult;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::future::Future;
use tracing::warn;

/// Stablecoins have no meaningful `<SYMBOL>USDT` order book
const QUOTE_SYMBOLS: [&str; 3] = ["USDT", "USDC", "DAI"];

/// Supplies the token and venue records the flow engine consumes
pub trait MarketDataSource {
    fn name(&self) -> &str;

    /// Top `limit` tokens by market cap
    fn fetch_markets(&self, limit: usize) -> impl Future<Output = SourceResult<Vec<TokenSnapshot>>> + Send;

    /// Bid/ask volumes per exchange for the given tokens
    fn fetch_exchange_tickers(
        &self,
        tokens: &[TokenSnapshot],
    ) -> impl Future<Output = SourceResult<Vec<ExchangeTicker>>> + Send;
}

/// Public CoinGecko market data, with optional Binance book tickers
pub struct LiveSource {
    coingecko: CoinGeckoClient,
    binance: Option<BinanceRestClient>,
    venue_pairs: usize,
}

impl LiveSource {
    /// # Arguments
    /// * `venue_pairs` - How many of the top tokens to sample on Binance each cycle
    pub fn new(coingecko: CoinGeckoClient, binance: Option<BinanceRestClient>, venue_pairs: usize) -> Self {
        Self {
            coingecko,
            binance,
            venue_pairs,
        }
    }
}

impl MarketDataSource for LiveSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_markets(&self, limit: usize) -> SourceResult<Vec<TokenSnapshot>> {
        let coins = self.coingecko.get_markets(limit).await?;
        Ok(coins.iter().map(|coin| coin.to_snapshot()).collect())
    }

    /// One aggregated Binance record: best bid/ask notional summed over the sampled pairs
    async fn fetch_exchange_tickers(&self, tokens: &[TokenSnapshot]) -> SourceResult<Vec<ExchangeTicker>> {
        let Some(binance) = &self.binance else {
            return Ok(Vec::new());
        };

        let pairs: Vec<String> = tokens
            .iter()
            .filter(|t| !t.symbol.is_empty() && !QUOTE_SYMBOLS.contains(&t.symbol.as_str()))
            .take(self.venue_pairs)
            .map(|t| format!("{}USDT", t.symbol))
            .collect();

        // Fetch all pairs concurrently
        let results = join_all(pairs.iter().map(|pair| binance.get_24hr_ticker(pair))).await;

        let mut bid_volume = Decimal::ZERO;
        let mut ask_volume = Decimal::ZERO;
        let mut volume = Decimal::ZERO;
        let mut sampled = 0;

        for (pair, result) in pairs.iter().zip(results) {
            match result {
                Ok(ticker) => {
                    bid_volume = bid_volume.saturating_add(ticker.bid_notional());
                    ask_volume = ask_volume.saturating_add(ticker.ask_notional());
                    volume = volume.saturating_add(ticker.quote_volume());
                    sampled += 1;
                }
                Err(e) => warn!("Skipping {} ticker: {}", pair, e),
            }
        }

        if sampled == 0 {
            return Ok(Vec::new());
        }

        Ok(vec![ExchangeTicker {
            venue: "binance".to_string(),
            bid_volume,
            ask_volume,
            volume,
        }])
    }
}
