use crate::data::{normalize_decimal, ExchangeInfo, GlobalMarket, TokenSnapshot, TrendingCoin};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entry of `/coins/markets`
///
/// Every numeric field is nullable in the API; `to_snapshot` is where
/// nulls become zero.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinMarket {
    pub id: String,  // "bitcoin"
    pub symbol: String,  // "btc"
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_1h_in_currency: Option<f64>,
    pub price_change_percentage_24h_in_currency: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
}

impl CoinMarket {
    /// Convert to our TokenSnapshot type
    pub fn to_snapshot(&self) -> TokenSnapshot {
        // Plain 24h change is always present; the in-currency one only when requested
        let change_24h = self
            .price_change_percentage_24h_in_currency
            .or(self.price_change_percentage_24h);

        TokenSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.to_uppercase(),
            rank: self.market_cap_rank,
            price: normalize_decimal(self.current_price),
            market_cap: normalize_decimal(self.market_cap),
            volume_24h: normalize_decimal(self.total_volume).max(Decimal::ZERO),
            change_1h: normalize_decimal(self.price_change_percentage_1h_in_currency),
            change_24h: normalize_decimal(change_24h),
            change_7d: normalize_decimal(self.price_change_percentage_7d_in_currency),
        }
    }
}

/// `/global` response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalData {
    #[serde(default)]
    pub total_market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap_percentage: HashMap<String, f64>,
    pub market_cap_change_percentage_24h_usd: Option<f64>,
    pub active_cryptocurrencies: Option<u64>,
    pub markets: Option<u64>,
}

impl GlobalData {
    pub fn to_global_market(&self) -> GlobalMarket {
        GlobalMarket {
            total_market_cap: normalize_decimal(self.total_market_cap.get("usd").copied()),
            total_volume: normalize_decimal(self.total_volume.get("usd").copied()),
            market_cap_change_24h: self.market_cap_change_percentage_24h_usd.unwrap_or(0.0),
            active_cryptocurrencies: self.active_cryptocurrencies.unwrap_or(0),
            active_exchanges: self.markets.unwrap_or(0),
            btc_dominance: self.market_cap_percentage.get("btc").copied().unwrap_or(0.0),
            eth_dominance: self.market_cap_percentage.get("eth").copied().unwrap_or(0.0),
        }
    }
}

/// `/search/trending` response
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub coins: Vec<TrendingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingEntry {
    pub item: TrendingItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingItem {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    pub price_btc: Option<f64>,
    pub score: Option<u32>,
}

impl TrendingItem {
    pub fn to_trending_coin(&self) -> TrendingCoin {
        TrendingCoin {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            market_cap_rank: self.market_cap_rank,
            price_btc: self.price_btc.unwrap_or(0.0),
            score: self.score.unwrap_or(0),
        }
    }
}

/// Entry of `/exchanges`
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeEntry {
    pub id: String,
    pub name: String,
    pub trust_score: Option<u32>,
    pub trade_volume_24h_btc: Option<f64>,
    pub year_established: Option<u32>,
    pub country: Option<String>,
}

impl ExchangeEntry {
    pub fn to_exchange_info(&self) -> ExchangeInfo {
        ExchangeInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            trust_score: self.trust_score,
            volume_24h_btc: normalize_decimal(self.trade_volume_24h_btc).max(Decimal::ZERO),
            year_established: self.year_established,
            country: self.country.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// `/coins/{id}/market_chart` response: `[timestamp_ms, value]` pairs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

impl MarketChart {
    /// Volume series, oldest first
    pub fn volumes(&self) -> Vec<Decimal> {
        self.total_volumes
            .iter()
            .map(|point| normalize_decimal(Some(point[1])))
            .collect()
    }

    /// Price series, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.prices.iter().map(|point| point[1]).collect()
    }
}
