use crate::analysis::venue::MAJOR_EXCHANGES;
use crate::data::{normalize_decimal, ExchangeTicker, TokenSnapshot};
use crate::error::SourceResult;
use crate::exchange::MarketDataSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

const DEMO_TOKENS: [(&str, &str, &str); 20] = [
    ("bitcoin", "Bitcoin", "BTC"),
    ("ethereum", "Ethereum", "ETH"),
    ("binancecoin", "BNB", "BNB"),
    ("cardano", "Cardano", "ADA"),
    ("solana", "Solana", "SOL"),
    ("ripple", "XRP", "XRP"),
    ("polkadot", "Polkadot", "DOT"),
    ("dogecoin", "Dogecoin", "DOGE"),
    ("avalanche-2", "Avalanche", "AVAX"),
    ("polygon", "Polygon", "MATIC"),
    ("chainlink", "Chainlink", "LINK"),
    ("uniswap", "Uniswap", "UNI"),
    ("litecoin", "Litecoin", "LTC"),
    ("cosmos", "Cosmos", "ATOM"),
    ("ethereum-classic", "Ethereum Classic", "ETC"),
    ("stellar", "Stellar", "XLM"),
    ("monero", "Monero", "XMR"),
    ("algorand", "Algorand", "ALGO"),
    ("vechain", "VeChain", "VET"),
    ("filecoin", "Filecoin", "FIL"),
];

/// Synthetic market data for offline runs
///
/// Each call advances an internal cycle counter, so consecutive cycles
/// differ while a given seed always produces the same sequence.
pub struct DemoSource {
    seed: u64,
    cycle: AtomicU64,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            cycle: AtomicU64::new(0),
        }
    }

    fn next_rng(&self) -> StdRng {
        let cycle = self.cycle.fetch_add(1, Ordering::Relaxed);
        StdRng::seed_from_u64(self.seed.wrapping_add(cycle))
    }

    /// Generate `limit` snapshots (at most one per demo token)
    pub fn generate_markets(&self, limit: usize) -> Vec<TokenSnapshot> {
        let mut rng = self.next_rng();

        DEMO_TOKENS
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, (id, name, symbol))| {
                let price: f64 = rng.gen_range(0.05..70_000.0);
                // Higher ranks trade more
                let volume: f64 = rng.gen_range(1.0e6..5.0e10) / (i as f64 + 1.0);
                let market_cap = volume * rng.gen_range(5.0..50.0_f64);

                TokenSnapshot {
                    id: id.to_string(),
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    rank: Some(i as u32 + 1),
                    price: normalize_decimal(Some(price)).round_dp(4),
                    market_cap: normalize_decimal(Some(market_cap)).round_dp(0),
                    volume_24h: normalize_decimal(Some(volume)).round_dp(0),
                    change_1h: normalize_decimal(Some(rng.gen_range(-3.0..3.0))).round_dp(2),
                    change_24h: normalize_decimal(Some(rng.gen_range(-10.0..10.0))).round_dp(2),
                    change_7d: normalize_decimal(Some(rng.gen_range(-25.0..25.0))).round_dp(2),
                }
            })
            .collect()
    }

    /// Random book-side volumes for the first few tracked exchanges
    pub fn generate_exchange_tickers(&self) -> Vec<ExchangeTicker> {
        let mut rng = self.next_rng();

        MAJOR_EXCHANGES
            .iter()
            .take(5)
            .map(|venue| {
                let bid: f64 = rng.gen_range(1.0e5..5.0e6);
                let ask: f64 = rng.gen_range(1.0e5..5.0e6);
                ExchangeTicker {
                    venue: venue.to_string(),
                    bid_volume: normalize_decimal(Some(bid)).round_dp(2),
                    ask_volume: normalize_decimal(Some(ask)).round_dp(2),
                    volume: normalize_decimal(Some(bid + ask)).round_dp(2),
                }
            })
            .collect()
    }
}

impl MarketDataSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_markets(&self, limit: usize) -> SourceResult<Vec<TokenSnapshot>> {
        Ok(self.generate_markets(limit))
    }

    async fn fetch_exchange_tickers(&self, _tokens: &[TokenSnapshot]) -> SourceResult<Vec<ExchangeTicker>> {
        Ok(self.generate_exchange_tickers())
    }
}
