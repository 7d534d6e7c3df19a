use crate::analysis::flow::{estimate_flow, FlowResult};
use crate::data::{Horizon, Sentiment, TokenSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Average flow (across the three horizons) above which a token is bullish
const SENTIMENT_THRESHOLD: Decimal = Decimal::ONE;

/// Flow estimates for one token across 1h / 24h / 7d
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiHorizonFlow {
    #[serde(rename = "1h")]
    pub one_hour: FlowResult,

    #[serde(rename = "24h")]
    pub one_day: FlowResult,

    #[serde(rename = "7d")]
    pub seven_days: FlowResult,

    pub overall_sentiment: Sentiment,
}

impl MultiHorizonFlow {
    pub fn get(&self, horizon: Horizon) -> &FlowResult {
        match horizon {
            Horizon::OneHour => &self.one_hour,
            Horizon::OneDay => &self.one_day,
            Horizon::SevenDays => &self.seven_days,
        }
    }

    /// Results keyed by horizon, shortest window first
    pub fn iter(&self) -> impl Iterator<Item = (Horizon, &FlowResult)> + '_ {
        Horizon::ALL.into_iter().map(move |h| (h, self.get(h)))
    }
}

/// Compose flow estimates for every horizon of a token
///
/// Algorithm:
/// 1. Derive each window volume from the 24h volume (24h / 24, 24h, 24h * 7)
/// 2. Estimate flow independently per horizon
/// 3. Average the three flow amounts into an overall sentiment
///
/// A horizon whose volume cannot be derived gets a zeroed result and the
/// sentiment becomes Unknown. Callers must read that as "unavailable".
pub fn compose_flow(snapshot: &TokenSnapshot) -> MultiHorizonFlow {
    let mut failed = false;

    // Ordering follows Horizon::ALL
    let [one_hour, one_day, seven_days] = Horizon::ALL.map(|horizon| {
        match horizon.window_volume(snapshot.volume_24h) {
            Some(volume) => estimate_flow(snapshot.change(horizon), volume, None),
            None => {
                warn!(
                    token = %snapshot.name,
                    horizon = %horizon,
                    "Window volume overflow, horizon unavailable"
                );
                failed = true;
                FlowResult::zeroed()
            }
        }
    });

    let overall_sentiment = if failed {
        Sentiment::Unknown
    } else {
        overall_sentiment(
            one_hour.flow_amount,
            one_day.flow_amount,
            seven_days.flow_amount,
        )
    };

    MultiHorizonFlow {
        one_hour,
        one_day,
        seven_days,
        overall_sentiment,
    }
}

/// Map the mean of three horizon flows to a sentiment bucket
///
/// The mean is taken over raw monetary amounts, so the 7d term dominates.
pub fn overall_sentiment(flow_1h: Decimal, flow_24h: Decimal, flow_7d: Decimal) -> Sentiment {
    let total = match flow_1h
        .checked_add(flow_24h)
        .and_then(|sum| sum.checked_add(flow_7d))
    {
        Some(total) => total,
        None => return Sentiment::Unknown,
    };

    let avg = total / Decimal::from(3);

    if avg > SENTIMENT_THRESHOLD {
        Sentiment::Bullish
    } else if avg < -SENTIMENT_THRESHOLD {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}
