use crate::analysis::PortfolioFlowSummary;
use anyhow::Result;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use rust_decimal::prelude::ToPrimitive;

/// Prometheus metrics for the monitor loop
///
/// All handles are atomic, so the struct is shared behind an `Arc` and
/// updated through `&self`.
pub struct MonitorMetrics {
    registry: Registry,
    cycles: IntCounter,
    fetch_errors: IntCounter,
    tokens: IntGauge,
    total_inflow: Gauge,
    total_outflow: Gauge,
    net_flow: Gauge,
    flow_ratio: Gauge,
}

impl MonitorMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("token_flow".to_string()), None)?;

        let cycles = IntCounter::new("cycles_total", "Completed monitor cycles")?;
        let fetch_errors = IntCounter::new("fetch_errors_total", "Failed market data fetches")?;
        let tokens = IntGauge::new("tokens", "Tokens analyzed in the last cycle")?;
        let total_inflow = Gauge::new("total_inflow_usd", "24h volume of inflow tokens")?;
        let total_outflow = Gauge::new("total_outflow_usd", "24h volume of outflow tokens")?;
        let net_flow = Gauge::new("net_flow_usd", "Inflow minus outflow volume")?;
        let flow_ratio = Gauge::new("flow_ratio", "Inflow share of directional volume")?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(tokens.clone()))?;
        registry.register(Box::new(total_inflow.clone()))?;
        registry.register(Box::new(total_outflow.clone()))?;
        registry.register(Box::new(net_flow.clone()))?;
        registry.register(Box::new(flow_ratio.clone()))?;

        Ok(Self {
            registry,
            cycles,
            fetch_errors,
            tokens,
            total_inflow,
            total_outflow,
            net_flow,
            flow_ratio,
        })
    }

    /// Record a completed cycle
    pub fn record_cycle(&self, token_count: usize, summary: &PortfolioFlowSummary) {
        self.cycles.inc();
        self.tokens.set(token_count as i64);
        self.total_inflow.set(summary.total_inflow.to_f64().unwrap_or(0.0));
        self.total_outflow.set(summary.total_outflow.to_f64().unwrap_or(0.0));
        self.net_flow.set(summary.net_flow.to_f64().unwrap_or(0.0));
        self.flow_ratio.set(summary.flow_ratio);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.inc();
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    pub fn fetch_errors(&self) -> u64 {
        self.fetch_errors.get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
