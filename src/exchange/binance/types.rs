use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn parse_or_zero(value: &str) -> Decimal {
    value.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Binance 24hr rolling ticker
///
/// All numeric fields arrive as strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,  // "BTCUSDT"
    pub last_price: String,
    pub bid_price: String,
    pub bid_qty: String,
    pub ask_price: String,
    pub ask_qty: String,
    pub volume: String,  // base asset
    pub quote_volume: String,  // quote asset (USDT)
}

impl Ticker24h {
    /// Notional resting at the best bid
    pub fn bid_notional(&self) -> Decimal {
        parse_or_zero(&self.bid_price)
            .checked_mul(parse_or_zero(&self.bid_qty))
            .unwrap_or(Decimal::ZERO)
    }

    /// Notional resting at the best ask
    pub fn ask_notional(&self) -> Decimal {
        parse_or_zero(&self.ask_price)
            .checked_mul(parse_or_zero(&self.ask_qty))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn quote_volume(&self) -> Decimal {
        parse_or_zero(&self.quote_volume)
    }
}

/// Extract close prices from raw kline rows
///
/// Each row is `[openTime, open, high, low, close, volume, closeTime, ...]`
/// with prices encoded as strings. Malformed rows are skipped.
pub fn parse_kline_closes(rows: &[Vec<serde_json::Value>]) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(4)?.as_str()?.parse::<f64>().ok())
        .filter(|close| close.is_finite())
        .collect()
}
