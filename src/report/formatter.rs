use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Flows smaller than this print as balanced
const FLOW_EPSILON: Decimal = dec!(0.01);

fn rounded(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Human-readable magnitude: 1.23B, 45.60M, 7.89K
///
/// Zero prints as "0".
pub fn format_number(value: Decimal, decimals: u32) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let abs = value.abs();
    let (scaled, suffix) = if abs >= dec!(1_000_000_000) {
        (value / dec!(1_000_000_000), "B")
    } else if abs >= dec!(1_000_000) {
        (value / dec!(1_000_000), "M")
    } else if abs >= dec!(1_000) {
        (value / dec!(1_000), "K")
    } else {
        (value, "")
    };

    format!("{:.*}{}", decimals as usize, rounded(scaled, decimals), suffix)
}

pub fn format_currency(value: Decimal, decimals: u32) -> String {
    if value.is_zero() {
        return "$0".to_string();
    }
    format!("${}", format_number(value, decimals))
}

/// Signed percentage, e.g. "+5.20%"
pub fn format_percentage(value: Decimal, decimals: u32) -> String {
    format!("{}%", signed(value, decimals))
}

/// Signed flow amount; values under one cent print as "0.00"
pub fn format_flow_value(value: Decimal, decimals: u32) -> String {
    if value.abs() < FLOW_EPSILON {
        return "0.00".to_string();
    }
    signed(value, decimals)
}

/// Signed magnitude with B/M/K suffix, e.g. "+52.00K"
pub fn format_flow_compact(value: Decimal, decimals: u32) -> String {
    if value.abs() < FLOW_EPSILON {
        return "0.00".to_string();
    }
    let body = format_number(value, decimals);
    if value.is_sign_negative() {
        body
    } else {
        format!("+{}", body)
    }
}

fn signed(value: Decimal, decimals: u32) -> String {
    let value = rounded(value, decimals);
    if value.is_zero() {
        // Drop the sign of negative zero
        return format!("+{:.*}", decimals as usize, Decimal::ZERO);
    }
    let sign = if value.is_sign_negative() { "" } else { "+" };
    format!("{}{:.*}", sign, decimals as usize, value)
}
