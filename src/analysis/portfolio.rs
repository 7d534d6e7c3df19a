use crate::analysis::horizon::{compose_flow, MultiHorizonFlow};
use crate::data::{FlowDirection, Horizon, TokenSnapshot};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of token names listed per side
pub const TOP_TOKENS_LIMIT: usize = 5;

/// Portfolio-level flow summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioFlowSummary {
    /// 24h volume of tokens classified as inflow
    pub total_inflow: Decimal,

    /// 24h volume of tokens classified as outflow
    pub total_outflow: Decimal,

    pub net_flow: Decimal,

    /// inflow / (inflow + outflow), 0.5 when both are zero
    pub flow_ratio: f64,

    /// First inflow tokens, in input order
    pub inflow_tokens: Vec<String>,

    /// First outflow tokens, in input order
    pub outflow_tokens: Vec<String>,
}

impl Default for PortfolioFlowSummary {
    fn default() -> Self {
        Self {
            total_inflow: Decimal::ZERO,
            total_outflow: Decimal::ZERO,
            net_flow: Decimal::ZERO,
            flow_ratio: 0.5,
            inflow_tokens: Vec::new(),
            outflow_tokens: Vec::new(),
        }
    }
}

impl PortfolioFlowSummary {
    /// Build a summary from tokens that were already composed
    ///
    /// Algorithm:
    /// 1. Classify each token by its 24h direction
    /// 2. Add the token's 24h window volume to that side's total
    /// 3. Keep the first five names per side, in encounter order
    /// 4. net = inflow - outflow, ratio = inflow / (inflow + outflow)
    ///
    /// Totals are volume sums, not sums of estimated flow amounts.
    pub fn from_flows<'a, I>(flows: I) -> Self
    where
        I: IntoIterator<Item = (&'a TokenSnapshot, &'a MultiHorizonFlow)>,
    {
        let mut summary = Self::default();

        for (token, flow) in flows {
            // 1-2. Only the 24h horizon drives the classification
            match flow.one_day.direction {
                FlowDirection::Inflow => {
                    summary.total_inflow = summary.total_inflow.saturating_add(flow.one_day.window_volume);
                    summary.inflow_tokens.push(token.name.clone());
                }
                FlowDirection::Outflow => {
                    summary.total_outflow = summary.total_outflow.saturating_add(flow.one_day.window_volume);
                    summary.outflow_tokens.push(token.name.clone());
                }
                FlowDirection::Balanced => {}
            }
        }

        // 3. Encounter order, not magnitude
        summary.inflow_tokens.truncate(TOP_TOKENS_LIMIT);
        summary.outflow_tokens.truncate(TOP_TOKENS_LIMIT);

        // 4. Aggregates
        summary.net_flow = summary.total_inflow.saturating_sub(summary.total_outflow);
        summary.flow_ratio = flow_ratio(summary.total_inflow, summary.total_outflow);

        summary
    }

    /// Inflow volume exceeds outflow volume
    pub fn is_net_inflow(&self) -> bool {
        self.net_flow > Decimal::ZERO
    }
}

/// Summarize flows across a token collection
pub fn summarize_flow(tokens: &[TokenSnapshot]) -> PortfolioFlowSummary {
    let flows: Vec<MultiHorizonFlow> = tokens.iter().map(compose_flow).collect();
    PortfolioFlowSummary::from_flows(tokens.iter().zip(flows.iter()))
}

/// Largest price moves over a horizon
///
/// Gainers are sorted by change descending and only include rising tokens;
/// losers the reverse.
pub fn top_movers(
    tokens: &[TokenSnapshot],
    horizon: Horizon,
    gainers: bool,
    limit: usize,
) -> Vec<&TokenSnapshot> {
    let mut movers: Vec<&TokenSnapshot> = tokens
        .iter()
        .filter(|t| {
            let change = t.change(horizon);
            if gainers {
                change > Decimal::ZERO
            } else {
                change < Decimal::ZERO
            }
        })
        .collect();

    if gainers {
        movers.sort_by(|a, b| b.change(horizon).cmp(&a.change(horizon)));
    } else {
        movers.sort_by(|a, b| a.change(horizon).cmp(&b.change(horizon)));
    }
    movers.truncate(limit);
    movers
}

/// Tokens with the highest 24h volume
pub fn volume_leaders(tokens: &[TokenSnapshot], limit: usize) -> Vec<&TokenSnapshot> {
    let mut leaders: Vec<&TokenSnapshot> = tokens.iter().collect();
    leaders.sort_by(|a, b| b.volume_24h.cmp(&a.volume_24h));
    leaders.truncate(limit);
    leaders
}

/// Look up a token by id, symbol or name, ignoring case
///
/// An exact match anywhere in the list wins; otherwise the first token
/// whose id, symbol or name contains the query is returned.
pub fn find_token<'a>(tokens: &'a [TokenSnapshot], query: &str) -> Option<&'a TokenSnapshot> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let fields = |t: &TokenSnapshot| [t.id.to_lowercase(), t.symbol.to_lowercase(), t.name.to_lowercase()];

    tokens
        .iter()
        .find(|t| fields(t).iter().any(|f| *f == query))
        .or_else(|| tokens.iter().find(|t| fields(t).iter().any(|f| f.contains(&query))))
}

fn flow_ratio(inflow: Decimal, outflow: Decimal) -> f64 {
    let total = inflow.saturating_add(outflow);
    if total.is_zero() {
        return 0.5;
    }

    inflow
        .checked_div(total)
        .and_then(|ratio| ratio.to_f64())
        .map(|ratio| ratio.clamp(0.0, 1.0))
        .unwrap_or(0.5)
}
