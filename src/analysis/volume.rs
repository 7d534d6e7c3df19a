use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the latest volume is above or below its recent average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeTrend::Increasing => f.pad("increasing"),
            VolumeTrend::Decreasing => f.pad("decreasing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub coin_id: String,
    pub current_volume: Decimal,
    pub avg_volume: Decimal,
    /// Day-over-day change of the latest point, in percent
    pub volume_change_24h: Decimal,
    pub trend: VolumeTrend,
}

/// Classify a daily volume history (oldest first)
///
/// Needs at least two points. The trend compares the latest volume to the
/// mean of the whole window; a latest volume equal to the mean counts as
/// decreasing.
pub fn analyze_volume_history(coin_id: &str, volumes: &[Decimal]) -> Option<VolumeAnalysis> {
    let (&current, rest) = volumes.split_last()?;
    let &previous = rest.last()?;

    let total = volumes
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    let avg_volume = total / Decimal::from(volumes.len());

    let volume_change_24h = if previous.is_zero() {
        Decimal::ZERO
    } else {
        current
            .checked_sub(previous)
            .and_then(|delta| delta.checked_div(previous))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    };

    let trend = if current > avg_volume {
        VolumeTrend::Increasing
    } else {
        VolumeTrend::Decreasing
    };

    Some(VolumeAnalysis {
        coin_id: coin_id.to_string(),
        current_volume: current,
        avg_volume,
        volume_change_24h,
        trend,
    })
}
