pub mod data;
pub mod analysis;
pub mod exchange;
pub mod error;
pub mod monitor;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use data::{EtfTicker, ExchangeTicker, FlowDirection, Horizon, Sentiment, TokenSnapshot};
pub use analysis::{
    compose_flow, estimate_flow, summarize_flow, FlowResult, MultiHorizonFlow,
    PortfolioFlowSummary, VenueClassifier,
};
pub use exchange::{BinanceRestClient, CoinGeckoClient, DemoSource, LiveSource, MarketDataSource, RetryPolicy};
pub use error::{SourceError, SourceResult};
pub use monitor::{CycleReport, FlowMonitor, TokenFlow};
pub use utils::{Config, MonitorMetrics};
