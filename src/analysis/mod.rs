pub mod flow;
pub mod horizon;
pub mod venue;
pub mod portfolio;
pub mod volume;
pub mod correlation;

pub use flow::{estimate_flow, FlowResult};
pub use horizon::{compose_flow, overall_sentiment, MultiHorizonFlow};
pub use venue::{
    classify_etf_flow, classify_exchange_flow, EtfFlowRecord, ExchangeFlowRecord,
    VenueClassifier,
};
pub use portfolio::{find_token, summarize_flow, top_movers, volume_leaders, PortfolioFlowSummary};
pub use volume::{analyze_volume_history, VolumeAnalysis, VolumeTrend};
pub use correlation::{correlation_matrix, CorrelationMatrix};
