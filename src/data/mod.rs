pub mod types;

pub use types::{
    normalize_decimal, EtfTicker, ExchangeInfo, ExchangeTicker, FlowDirection, GlobalMarket, Horizon,
    Sentiment, TokenSnapshot, TrendingCoin,
};
