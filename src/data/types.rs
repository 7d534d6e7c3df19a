use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalize a nullable float from an API payload into a Decimal.
///
/// Missing, NaN, infinite and out-of-range values all collapse to zero.
/// This is the only place loosely-typed numbers enter the core.
pub fn normalize_decimal(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
}

/// Time window a price change and volume are evaluated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::OneHour, Horizon::OneDay, Horizon::SevenDays];

    pub fn key(&self) -> &'static str {
        match self {
            Horizon::OneHour => "1h",
            Horizon::OneDay => "24h",
            Horizon::SevenDays => "7d",
        }
    }

    /// Derive this window's volume from the reported 24h volume.
    ///
    /// The 1h and 7d figures are approximations (24h / 24 and 24h * 7).
    /// Returns None if the 7d scaling overflows.
    pub fn window_volume(&self, volume_24h: Decimal) -> Option<Decimal> {
        match self {
            Horizon::OneHour => volume_24h.checked_div(Decimal::from(24)),
            Horizon::OneDay => Some(volume_24h),
            Horizon::SevenDays => volume_24h.checked_mul(Decimal::from(7)),
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Horizon::ALL
            .into_iter()
            .find(|h| h.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown horizon '{}', expected 1h, 24h or 7d", s))
    }
}

/// Categorical flow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    Inflow,
    Outflow,
    Balanced,
}

impl FlowDirection {
    /// Direction from the sign of a signed quantity (zero = balanced)
    pub fn from_sign(value: Decimal) -> Self {
        if value > Decimal::ZERO {
            FlowDirection::Inflow
        } else if value < Decimal::ZERO {
            FlowDirection::Outflow
        } else {
            FlowDirection::Balanced
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlowDirection::Inflow => "inflow",
            FlowDirection::Outflow => "outflow",
            FlowDirection::Balanced => "balanced",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Overall market sentiment for a token across all horizons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
    /// Computation failed; flows for this token are unavailable
    Unknown,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
            Sentiment::Unknown => "unknown",
        };
        f.pad(s)
    }
}

/// Market snapshot of a single token
///
/// All numeric fields are already normalized: absent changes and volume are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub id: String,          // "bitcoin"
    pub name: String,        // "Bitcoin"
    pub symbol: String,      // "BTC"
    pub rank: Option<u32>,
    pub price: Decimal,
    pub market_cap: Decimal,
    pub volume_24h: Decimal, // USD, never negative
    pub change_1h: Decimal,  // percent
    pub change_24h: Decimal,
    pub change_7d: Decimal,
}

impl TokenSnapshot {
    /// Snapshot carrying only what the flow engine needs
    pub fn new(
        name: &str,
        change_1h: Decimal,
        change_24h: Decimal,
        change_7d: Decimal,
        volume_24h: Decimal,
    ) -> Self {
        Self {
            id: name.to_lowercase(),
            name: name.to_string(),
            symbol: String::new(),
            rank: None,
            price: Decimal::ZERO,
            market_cap: Decimal::ZERO,
            volume_24h: volume_24h.max(Decimal::ZERO),
            change_1h,
            change_24h,
            change_7d,
        }
    }

    /// Price change for the given horizon
    pub fn change(&self, horizon: Horizon) -> Decimal {
        match horizon {
            Horizon::OneHour => self.change_1h,
            Horizon::OneDay => self.change_24h,
            Horizon::SevenDays => self.change_7d,
        }
    }

    /// 24h volume relative to market cap (zero when market cap is unknown)
    pub fn volume_market_cap_ratio(&self) -> Decimal {
        if self.market_cap.is_zero() {
            return Decimal::ZERO;
        }
        self.volume_24h / self.market_cap
    }
}

/// Bid/ask volumes reported for one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeTicker {
    pub venue: String,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    pub volume: Decimal,
}

/// Daily flow figures for one ETF instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfTicker {
    pub ticker: String,
    #[serde(default)]
    pub net_flow: Decimal,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub premium: Decimal,
}

/// Global market overview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMarket {
    pub total_market_cap: Decimal,
    pub total_volume: Decimal,
    pub market_cap_change_24h: f64,
    pub active_cryptocurrencies: u64,
    pub active_exchanges: u64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
}

/// Spot exchange with its reported 24h volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub id: String,
    pub name: String,
    pub trust_score: Option<u32>,  // 1-10
    pub volume_24h_btc: Decimal,
    pub year_established: Option<u32>,
    pub country: Option<String>,
}

/// Coin from the trending search list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    pub price_btc: f64,
    pub score: u32,
}
