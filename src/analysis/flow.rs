use crate::data::FlowDirection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest share of volume attributed to flow, however large the price swing
pub const MAX_FLOW_RATIO: Decimal = dec!(0.3);

/// Absolute price change (percent) at which confidence saturates
pub const CONFIDENCE_SATURATION_PCT: Decimal = dec!(10);

/// Estimated flow for one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    /// Signed estimate: positive = inflow, negative = outflow
    pub flow_amount: Decimal,

    /// Categorical view, derived from the sign of the price change
    pub direction: FlowDirection,

    /// 0.0 to 1.0
    pub confidence: f64,

    /// Volume figure the estimate was based on
    pub window_volume: Decimal,

    /// Input price change in percent
    pub price_change: Decimal,
}

impl FlowResult {
    /// Result used when a horizon could not be computed
    pub fn zeroed() -> Self {
        Self {
            flow_amount: Decimal::ZERO,
            direction: FlowDirection::Balanced,
            confidence: 0.0,
            window_volume: Decimal::ZERO,
            price_change: Decimal::ZERO,
        }
    }
}

/// Estimate fund flow from a price change and the traded volume
///
/// This is an estimate, not a measurement of capital movement.
///
/// Algorithm:
/// 1. ratio = min(|change| / 100, 0.3)
/// 2. flow = +volume * ratio on a rise, -volume * ratio on a fall, 0 when flat
/// 3. confidence = min(|change| / 10, 1.0)
///
/// # Arguments
/// * `price_change_pct` - Signed price change in percent (e.g. 5.2)
/// * `volume` - Non-negative traded volume for the window
/// * `_volatility` - Accepted for compatibility, not used
pub fn estimate_flow(
    price_change_pct: Decimal,
    volume: Decimal,
    _volatility: Option<Decimal>,
) -> FlowResult {
    let magnitude = price_change_pct.abs();

    // 1. Share of volume attributed to flow
    let ratio = (magnitude / dec!(100)).min(MAX_FLOW_RATIO);

    // 2. Direction follows the sign of the price change
    let direction = FlowDirection::from_sign(price_change_pct);
    let flow_amount = match direction {
        FlowDirection::Inflow => volume * ratio,
        FlowDirection::Outflow => -(volume * ratio),
        FlowDirection::Balanced => Decimal::ZERO,
    };

    // 3. Confidence grows with the size of the move
    let confidence = (magnitude / CONFIDENCE_SATURATION_PCT)
        .min(Decimal::ONE)
        .to_f64()
        .unwrap_or(0.0);

    FlowResult {
        flow_amount,
        direction,
        confidence,
        window_volume: volume,
        price_change: price_change_pct,
    }
}
