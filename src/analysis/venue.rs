use crate::data::{EtfTicker, ExchangeTicker, FlowDirection};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Exchanges whose order flow is classified
pub const MAJOR_EXCHANGES: [&str; 10] = [
    "binance", "coinbase", "kraken", "kucoin", "okx",
    "bybit", "gate-io", "huobi", "bitfinex", "bitstamp",
];

/// ETF tickers whose creations/redemptions are classified
pub const MAJOR_ETFS: [&str; 6] = ["GBTC", "ETHE", "BITO", "BITI", "BTF", "BITS"];

/// Buy ratio above which an exchange is seeing inflow
const INFLOW_BUY_RATIO: Decimal = dec!(0.6);

/// Buy ratio below which an exchange is seeing outflow
const OUTFLOW_BUY_RATIO: Decimal = dec!(0.4);

const BALANCED_CONFIDENCE: f64 = 0.5;

/// Flow classification for one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeFlowRecord {
    pub direction: FlowDirection,
    pub confidence: f64,
    pub buy_ratio: f64,
    pub volume: Decimal,
}

/// Flow classification for one ETF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfFlowRecord {
    pub direction: FlowDirection,
    pub confidence: f64,
    pub amount: Decimal,
    pub premium: Decimal,
}

/// Classify an exchange by the share of bid volume in its book
///
/// Algorithm:
/// 1. Skip the venue unless both sides have volume
/// 2. buy_ratio = bid / (bid + ask)
/// 3. > 0.6 = inflow, < 0.4 = outflow, anything between is balanced
///
/// Returns None when the venue cannot be classified.
pub fn classify_exchange_flow(
    bid_volume: Decimal,
    ask_volume: Decimal,
    total_volume: Decimal,
) -> Option<ExchangeFlowRecord> {
    // 1. Both sides required
    if bid_volume <= Decimal::ZERO || ask_volume <= Decimal::ZERO {
        return None;
    }

    // 2. Share of resting volume on the bid
    let buy_ratio = bid_volume.checked_add(ask_volume).and_then(|total| bid_volume.checked_div(total))?;

    // 3. Bucket; both thresholds are exclusive
    let (direction, confidence) = if buy_ratio > INFLOW_BUY_RATIO {
        (FlowDirection::Inflow, buy_ratio.to_f64()?)
    } else if buy_ratio < OUTFLOW_BUY_RATIO {
        (FlowDirection::Outflow, (Decimal::ONE - buy_ratio).to_f64()?)
    } else {
        (FlowDirection::Balanced, BALANCED_CONFIDENCE)
    };

    Some(ExchangeFlowRecord {
        direction,
        confidence,
        buy_ratio: buy_ratio.to_f64()?,
        volume: total_volume,
    })
}

/// Classify an ETF by the sign of its net flow
///
/// Confidence is the net flow as a share of traded volume (capped at 1.0),
/// or 0.5 when there is no volume to compare against.
pub fn classify_etf_flow(net_flow: Decimal, volume: Decimal, premium: Decimal) -> EtfFlowRecord {
    let direction = FlowDirection::from_sign(net_flow);

    if direction == FlowDirection::Balanced {
        return EtfFlowRecord {
            direction,
            confidence: BALANCED_CONFIDENCE,
            amount: Decimal::ZERO,
            premium,
        };
    }

    let confidence = if volume > Decimal::ZERO {
        net_flow
            .abs()
            .checked_div(volume)
            .map(|share| share.min(Decimal::ONE))
            .and_then(|share| share.to_f64())
            .unwrap_or(BALANCED_CONFIDENCE)
    } else {
        BALANCED_CONFIDENCE
    };

    EtfFlowRecord {
        direction,
        confidence,
        amount: net_flow,
        premium,
    }
}

/// Classifies exchange and ETF venues against fixed allow-lists
#[derive(Debug, Clone)]
pub struct VenueClassifier {
    exchanges: HashSet<String>,
    etfs: HashSet<String>,
}

impl Default for VenueClassifier {
    fn default() -> Self {
        Self::new(MAJOR_EXCHANGES, MAJOR_ETFS)
    }
}

impl VenueClassifier {
    /// Create classifier with custom allow-lists
    ///
    /// Exchange ids are matched case-insensitively, ETF tickers are
    /// matched upper-case.
    pub fn new<E, T>(exchanges: E, etfs: T) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            exchanges: exchanges.into_iter().map(|e| e.as_ref().to_lowercase()).collect(),
            etfs: etfs.into_iter().map(|t| t.as_ref().to_uppercase()).collect(),
        }
    }

    pub fn is_tracked_exchange(&self, venue: &str) -> bool {
        self.exchanges.contains(&venue.to_lowercase())
    }

    pub fn is_tracked_etf(&self, ticker: &str) -> bool {
        self.etfs.contains(&ticker.to_uppercase())
    }

    /// Classify every tracked exchange that has both bid and ask volume
    pub fn analyze_exchanges(&self, tickers: &[ExchangeTicker]) -> BTreeMap<String, ExchangeFlowRecord> {
        tickers
            .iter()
            .filter(|t| self.is_tracked_exchange(&t.venue))
            .filter_map(|t| {
                classify_exchange_flow(t.bid_volume, t.ask_volume, t.volume)
                    .map(|record| (t.venue.to_lowercase(), record))
            })
            .collect()
    }

    /// Classify every tracked ETF
    pub fn analyze_etfs(&self, tickers: &[EtfTicker]) -> BTreeMap<String, EtfFlowRecord> {
        tickers
            .iter()
            .filter(|t| self.is_tracked_etf(&t.ticker))
            .map(|t| {
                (
                    t.ticker.to_uppercase(),
                    classify_etf_flow(t.net_flow, t.volume, t.premium),
                )
            })
            .collect()
    }
}
