use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::path::PathBuf;
use token_flow::analysis::{analyze_volume_history, correlation_matrix, find_token, top_movers, volume_leaders};
use token_flow::data::{Horizon, TokenSnapshot};
use token_flow::report::printer::{
    write_correlation, write_exchanges, write_global, write_market_table, write_token_detail, write_token_list,
    write_trending, write_volume_analysis,
};
use token_flow::utils::init_from_config;
use token_flow::{BinanceRestClient, CoinGeckoClient, Config, DemoSource, MarketDataSource};
use tracing::{error, info, warn};

/// Market overview reports: movers, volume, global stats and correlation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $CONFIG_FILE or config/default.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use synthetic market data (market, token, movers and volume reports only)
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top tokens with all price changes and volume/market-cap ratio
    Markets {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Details for one token, matched by id, symbol or name
    Token {
        query: String,
    },
    /// Largest price increases
    Gainers {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// 1h, 24h or 7d
        #[arg(long, default_value = "24h")]
        horizon: Horizon,
    },
    /// Largest price decreases
    Losers {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "24h")]
        horizon: Horizon,
    },
    /// Highest 24h trading volume
    Volume {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Global market capitalization and dominance
    Global,
    /// Exchange volume distribution
    Exchanges {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Trending searches
    Trending,
    /// Daily volume trend per coin
    Trends {
        /// CoinGecko coin ids
        #[arg(default_values_t = ["bitcoin".to_string(), "ethereum".to_string(), "binancecoin".to_string()])]
        coins: Vec<String>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Pearson correlation of daily closes
    Correlation {
        /// Base symbols, quoted in USDT
        #[arg(default_values_t = ["BTC".to_string(), "ETH".to_string(), "BNB".to_string(), "SOL".to_string()])]
        symbols: Vec<String>,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

/// Markets are sampled this deep before ranking
const MARKET_SAMPLE: usize = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if args.demo {
        config.general.demo = true;
    }
    init_from_config(&config.logging)?;

    let mut out = String::new();
    match &args.command {
        Command::Markets { limit } => {
            let tokens = load_markets(&config).await?;
            let shown = &tokens[..tokens.len().min(*limit)];
            write_market_table(&mut out, shown)?;
        }
        Command::Token { query } => {
            let tokens = load_markets(&config).await?;
            match find_token(&tokens, query) {
                Some(token) => write_token_detail(&mut out, token)?,
                None => {
                    warn!("No token matching {:?} in the top {} markets", query, tokens.len());
                    out.push_str("no data available\n");
                }
            }
        }
        Command::Gainers { limit, horizon } => {
            let tokens = load_markets(&config).await?;
            let movers = top_movers(&tokens, *horizon, true, *limit);
            write_token_list(&mut out, &format!("Top gainers ({})", horizon), &movers, *horizon)?;
        }
        Command::Losers { limit, horizon } => {
            let tokens = load_markets(&config).await?;
            let movers = top_movers(&tokens, *horizon, false, *limit);
            write_token_list(&mut out, &format!("Top losers ({})", horizon), &movers, *horizon)?;
        }
        Command::Volume { limit } => {
            let tokens = load_markets(&config).await?;
            let leaders = volume_leaders(&tokens, *limit);
            write_token_list(&mut out, "Volume leaders", &leaders, Horizon::OneDay)?;
        }
        Command::Global => {
            let client = coingecko(&config)?;
            match client.get_global().await {
                Ok(global) => write_global(&mut out, &global)?,
                Err(e) => {
                    error!("Failed to fetch global market: {}", e);
                    out.push_str("no data available\n");
                }
            }
        }
        Command::Exchanges { limit } => {
            let client = coingecko(&config)?;
            let exchanges = client.get_exchanges(*limit).await.unwrap_or_else(|e| {
                error!("Failed to fetch exchanges: {}", e);
                Vec::new()
            });
            write_exchanges(&mut out, &exchanges)?;
        }
        Command::Trending => {
            let client = coingecko(&config)?;
            let coins = client.get_trending().await.unwrap_or_else(|e| {
                error!("Failed to fetch trending coins: {}", e);
                Vec::new()
            });
            write_trending(&mut out, &coins)?;
        }
        Command::Trends { coins, days } => {
            let client = coingecko(&config)?;
            let mut analyses = Vec::new();
            // Sequential to stay under the public rate limit
            for coin in coins {
                match client.get_market_chart(coin, *days).await {
                    Ok(chart) => match analyze_volume_history(coin, &chart.volumes()) {
                        Some(analysis) => analyses.push(analysis),
                        None => warn!("Not enough volume history for {}", coin),
                    },
                    Err(e) => error!("Failed to fetch market chart for {}: {}", coin, e),
                }
            }
            write_volume_analysis(&mut out, &analyses)?;
        }
        Command::Correlation { symbols, days } => {
            if config.general.demo {
                bail!("correlation needs live Binance data");
            }
            let client = BinanceRestClient::new(&config.sources.binance_url, config.retry.clone())?;

            let pairs: Vec<String> = symbols.iter().map(|s| format!("{}USDT", s.to_uppercase())).collect();
            let results = join_all(pairs.iter().map(|pair| client.get_closes(pair, "1d", *days))).await;

            let mut series = BTreeMap::new();
            for (symbol, result) in symbols.iter().zip(results) {
                match result {
                    Ok(closes) => {
                        series.insert(symbol.to_uppercase(), closes);
                    }
                    Err(e) => error!("Failed to fetch closes for {}: {}", symbol, e),
                }
            }
            write_correlation(&mut out, &correlation_matrix(&series))?;
        }
    }

    print!("{}", out);
    Ok(())
}

fn coingecko(config: &Config) -> Result<CoinGeckoClient> {
    if config.general.demo {
        bail!("this report needs live CoinGecko data");
    }
    Ok(CoinGeckoClient::new(
        &config.sources.coingecko_url,
        config.sources.coingecko_api_key.clone(),
        config.retry.clone(),
    )?)
}

/// Top markets from the configured source; empty on fetch failure
async fn load_markets(config: &Config) -> Result<Vec<TokenSnapshot>> {
    let result = if config.general.demo {
        DemoSource::new(config.general.demo_seed).fetch_markets(MARKET_SAMPLE).await
    } else {
        coingecko(config)?
            .get_markets(MARKET_SAMPLE)
            .await
            .map(|coins| coins.iter().map(|coin| coin.to_snapshot()).collect())
    };

    match result {
        Ok(tokens) => {
            info!("Loaded {} markets", tokens.len());
            Ok(tokens)
        }
        Err(e) => {
            error!("Failed to fetch markets: {}", e);
            Ok(Vec::new())
        }
    }
}
