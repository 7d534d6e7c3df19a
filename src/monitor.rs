use crate::analysis::{
    compose_flow, EtfFlowRecord, ExchangeFlowRecord, MultiHorizonFlow, PortfolioFlowSummary, VenueClassifier,
};
use crate::data::{EtfTicker, TokenSnapshot};
use crate::exchange::MarketDataSource;
use crate::utils::MonitorMetrics;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// One token with its composed flows
#[derive(Debug, Clone, Serialize)]
pub struct TokenFlow {
    pub token: TokenSnapshot,
    pub flow: MultiHorizonFlow,
}

/// Everything produced by one monitor cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub tokens: Vec<TokenFlow>,
    pub summary: PortfolioFlowSummary,
    pub exchanges: BTreeMap<String, ExchangeFlowRecord>,
    pub etfs: BTreeMap<String, EtfFlowRecord>,
}

/// Polls a market data source and runs the flow pipeline on each snapshot
pub struct FlowMonitor<S: MarketDataSource> {
    source: S,
    classifier: VenueClassifier,
    metrics: Option<Arc<MonitorMetrics>>,
    etf_tickers: Vec<EtfTicker>,
    limit: usize,
}

impl<S: MarketDataSource> FlowMonitor<S> {
    pub fn new(source: S, classifier: VenueClassifier, limit: usize) -> Self {
        Self {
            source,
            classifier,
            metrics: None,
            etf_tickers: Vec::new(),
            limit,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MonitorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// ETF flows have no live feed; they are supplied once and reclassified every cycle
    pub fn with_etf_tickers(mut self, tickers: Vec<EtfTicker>) -> Self {
        self.etf_tickers = tickers;
        self
    }

    /// Fetch, compose, aggregate and classify once
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let snapshots = match self.source.fetch_markets(self.limit).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_fetch_error();
                }
                return Err(e).with_context(|| format!("Failed to fetch markets from {}", self.source.name()));
            }
        };
        debug!("Fetched {} tokens from {}", snapshots.len(), self.source.name());

        let tokens: Vec<TokenFlow> = snapshots
            .into_iter()
            .map(|token| {
                let flow = compose_flow(&token);
                TokenFlow { token, flow }
            })
            .collect();

        let summary = PortfolioFlowSummary::from_flows(tokens.iter().map(|t| (&t.token, &t.flow)));

        // Venue data is optional; the token report stands without it
        let snapshots: Vec<TokenSnapshot> = tokens.iter().map(|t| t.token.clone()).collect();
        let exchange_tickers = match self.source.fetch_exchange_tickers(&snapshots).await {
            Ok(tickers) => tickers,
            Err(e) => {
                warn!("Exchange tickers unavailable: {}", e);
                Vec::new()
            }
        };

        let exchanges = self.classifier.analyze_exchanges(&exchange_tickers);
        let etfs = self.classifier.analyze_etfs(&self.etf_tickers);

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(tokens.len(), &summary);
        }

        info!(
            "Cycle complete: {} tokens, net flow {}, ratio {:.2}, {} exchanges, {} ETFs",
            tokens.len(),
            summary.net_flow,
            summary.flow_ratio,
            exchanges.len(),
            etfs.len()
        );

        Ok(CycleReport {
            timestamp: Utc::now(),
            source: self.source.name().to_string(),
            tokens,
            summary,
            exchanges,
            etfs,
        })
    }

    /// Run cycles until Ctrl-C or `max_cycles` completes
    ///
    /// Failed cycles are logged and retried after `error_backoff`; they do
    /// not count toward `max_cycles`. Returns the number of successful cycles.
    pub async fn run_continuous<F>(
        &self,
        interval: Duration,
        error_backoff: Duration,
        max_cycles: Option<u64>,
        on_report: F,
    ) -> Result<u64>
    where
        F: FnMut(&CycleReport),
    {
        info!("Press Ctrl+C to stop");
        self.run_until(interval, error_backoff, max_cycles, tokio::signal::ctrl_c(), on_report)
            .await
    }

    /// Run cycles until `shutdown` resolves or `max_cycles` completes
    ///
    /// `shutdown` is raced against both the cycle and the wait that follows,
    /// so a cycle still fetching when it fires is abandoned.
    pub async fn run_until<F, Fut>(
        &self,
        interval: Duration,
        error_backoff: Duration,
        max_cycles: Option<u64>,
        shutdown: Fut,
        mut on_report: F,
    ) -> Result<u64>
    where
        F: FnMut(&CycleReport),
        Fut: Future,
    {
        info!("Monitoring {} every {:?}", self.source.name(), interval);
        let mut completed = 0u64;
        tokio::pin!(shutdown);

        loop {
            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested during cycle");
                    break;
                }
                outcome = self.run_cycle() => outcome,
            };

            let wait = match outcome {
                Ok(report) => {
                    on_report(&report);
                    completed += 1;
                    if max_cycles.is_some_and(|max| completed >= max) {
                        break;
                    }
                    interval
                }
                Err(e) => {
                    error!("Cycle failed: {:#}", e);
                    error_backoff
                }
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Monitor stopped after {} cycles", completed);
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExchangeTicker, Sentiment};
    use crate::error::{SourceError, SourceResult};
    use crate::exchange::DemoSource;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    /// Serves fixed markets, and fails the first `market_failures` market fetches
    struct ScriptedSource {
        tokens: Vec<TokenSnapshot>,
        market_failures: AtomicU32,
        tickers_fail: bool,
    }

    impl ScriptedSource {
        fn new(tokens: Vec<TokenSnapshot>) -> Self {
            Self {
                tokens,
                market_failures: AtomicU32::new(0),
                tickers_fail: false,
            }
        }
    }

    impl MarketDataSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_markets(&self, limit: usize) -> SourceResult<Vec<TokenSnapshot>> {
            let remaining = self.market_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.market_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(SourceError::RateLimited { attempts: 3 });
            }
            Ok(self.tokens.iter().take(limit).cloned().collect())
        }

        async fn fetch_exchange_tickers(&self, _tokens: &[TokenSnapshot]) -> SourceResult<Vec<ExchangeTicker>> {
            if self.tickers_fail {
                return Err(SourceError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(vec![
                ExchangeTicker {
                    venue: "Binance".to_string(),
                    bid_volume: dec!(700),
                    ask_volume: dec!(300),
                    volume: dec!(1000),
                },
                ExchangeTicker {
                    venue: "tinydex".to_string(),
                    bid_volume: dec!(1),
                    ask_volume: dec!(1),
                    volume: dec!(2),
                },
            ])
        }
    }

    fn sample_tokens() -> Vec<TokenSnapshot> {
        vec![
            TokenSnapshot::new("Bitcoin", dec!(0.5), dec!(5.2), dec!(10), dec!(1000000)),
            TokenSnapshot::new("Ethereum", dec!(-0.2), dec!(-3), dec!(-8), dec!(400000)),
            TokenSnapshot::new("Tether", dec!(0), dec!(0), dec!(0), dec!(900000)),
        ]
    }

    #[tokio::test]
    async fn test_cycle_report() {
        let source = ScriptedSource::new(sample_tokens());
        let etfs = vec![EtfTicker {
            ticker: "gbtc".to_string(),
            net_flow: dec!(-250),
            volume: dec!(1000),
            premium: dec!(-1.5),
        }];
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 10).with_etf_tickers(etfs);

        let report = monitor.run_cycle().await.unwrap();

        assert_eq!(report.source, "scripted");
        assert_eq!(report.tokens.len(), 3);
        assert_eq!(report.tokens[0].flow.one_day.flow_amount, dec!(52000));
        assert_eq!(report.tokens[0].flow.overall_sentiment, Sentiment::Bullish);
        assert_eq!(report.summary.total_inflow, dec!(1000000));
        assert_eq!(report.summary.total_outflow, dec!(400000));
        assert_eq!(report.summary.inflow_tokens, vec!["Bitcoin"]);

        // Untracked venue dropped, key normalized
        assert_eq!(report.exchanges.len(), 1);
        assert!(report.exchanges.contains_key("binance"));
        assert!(report.etfs.contains_key("GBTC"));
    }

    #[tokio::test]
    async fn test_market_failure_records_metric() {
        let source = ScriptedSource::new(sample_tokens());
        source.market_failures.store(1, Ordering::SeqCst);
        let metrics = Arc::new(MonitorMetrics::new().unwrap());
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 10).with_metrics(Arc::clone(&metrics));

        let err = monitor.run_cycle().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Rate limited"));
        assert_eq!(metrics.fetch_errors(), 1);
        assert_eq!(metrics.cycles(), 0);

        // Next cycle recovers
        monitor.run_cycle().await.unwrap();
        assert_eq!(metrics.cycles(), 1);
    }

    #[tokio::test]
    async fn test_ticker_failure_keeps_token_report() {
        let mut source = ScriptedSource::new(sample_tokens());
        source.tickers_fail = true;
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 2);

        let report = monitor.run_cycle().await.unwrap();

        assert_eq!(report.tokens.len(), 2);
        assert!(report.exchanges.is_empty());
    }

    #[tokio::test]
    async fn test_continuous_stops_after_max_cycles() {
        let monitor = FlowMonitor::new(DemoSource::new(42), VenueClassifier::default(), 5);
        let mut seen = Vec::new();

        let completed = monitor
            .run_continuous(Duration::from_millis(1), Duration::from_millis(1), Some(3), |report| {
                seen.push(report.tokens.len())
            })
            .await
            .unwrap();

        assert_eq!(completed, 3);
        assert_eq!(seen, vec![5, 5, 5]);
    }

    #[tokio::test]
    async fn test_continuous_retries_failed_cycles() {
        let source = ScriptedSource::new(sample_tokens());
        source.market_failures.store(2, Ordering::SeqCst);
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 10);

        let completed = monitor
            .run_continuous(Duration::from_millis(1), Duration::from_millis(1), Some(1), |_| {})
            .await
            .unwrap();

        assert_eq!(completed, 1);
    }

    /// Fires `trigger` inside the second market fetch, then stalls like a slow request
    struct StallingSource {
        calls: AtomicU32,
        trigger: Box<dyn Fn() + Send + Sync>,
    }

    impl MarketDataSource for StallingSource {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn fetch_markets(&self, limit: usize) -> SourceResult<Vec<TokenSnapshot>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                (self.trigger)();
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(sample_tokens().into_iter().take(limit).collect())
        }

        async fn fetch_exchange_tickers(&self, _tokens: &[TokenSnapshot]) -> SourceResult<Vec<ExchangeTicker>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_shutdown_during_fetch_abandons_cycle() {
        let notify = Arc::new(Notify::new());
        let trigger = Arc::clone(&notify);
        let source = StallingSource {
            calls: AtomicU32::new(0),
            trigger: Box::new(move || trigger.notify_one()),
        };
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 10);

        let completed = monitor
            .run_until(
                Duration::from_millis(20),
                Duration::from_millis(20),
                Some(6),
                notify.notified(),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(completed, 1);
        assert_eq!(monitor.source.calls.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ctrl_c_during_fetch_stops_continuous() {
        let source = StallingSource {
            calls: AtomicU32::new(0),
            trigger: Box::new(|| {
                std::process::Command::new("kill")
                    .args(["-INT", &std::process::id().to_string()])
                    .status()
                    .unwrap();
            }),
        };
        let monitor = FlowMonitor::new(source, VenueClassifier::default(), 10);

        let completed = monitor
            .run_continuous(Duration::from_millis(20), Duration::from_millis(20), Some(6), |_| {})
            .await
            .unwrap();

        assert_eq!(completed, 1);
    }
}
