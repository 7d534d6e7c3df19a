use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use token_flow::analysis::VenueClassifier;
use token_flow::data::EtfTicker;
use token_flow::report::printer::write_cycle_report;
use token_flow::utils::init_from_config;
use token_flow::{
    BinanceRestClient, CoinGeckoClient, Config, CycleReport, DemoSource, FlowMonitor, LiveSource,
    MarketDataSource, MonitorMetrics,
};
use tracing::{error, info, warn};

/// Estimate capital inflow and outflow for the top tokens by market cap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $CONFIG_FILE or config/default.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of tokens to analyze
    #[arg(short, long)]
    limit: Option<usize>,

    /// Keep polling until Ctrl+C
    #[arg(long)]
    continuous: bool,

    /// Seconds between cycles in continuous mode
    #[arg(short, long)]
    interval: Option<u64>,

    /// Stop after this many successful cycles
    #[arg(long, requires = "continuous")]
    cycles: Option<u64>,

    /// Use synthetic data instead of live APIs
    #[arg(long)]
    demo: bool,

    /// Seed for demo data
    #[arg(long)]
    seed: Option<u64>,

    /// JSON array of ETF flow records to classify each cycle
    #[arg(long)]
    etf_file: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after each cycle
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    init_from_config(&config.logging)?;
    info!("Configuration loaded: {}", config.general.environment);

    let etf_tickers = match args.etf_file.clone().or_else(|| config.monitor.etf_file.clone().map(PathBuf::from)) {
        Some(path) => load_etf_tickers(&path)?,
        None => Vec::new(),
    };

    let metrics = if config.metrics.enabled {
        Some(Arc::new(MonitorMetrics::new()?))
    } else {
        None
    };

    if config.general.demo {
        info!("Demo mode, seed {}", config.general.demo_seed);
        let source = DemoSource::new(config.general.demo_seed);
        run(source, &config, &args, etf_tickers, metrics).await
    } else {
        let coingecko = CoinGeckoClient::new(
            &config.sources.coingecko_url,
            config.sources.coingecko_api_key.clone(),
            config.retry.clone(),
        )?;
        let binance = if config.sources.binance_enabled {
            let client = BinanceRestClient::new(&config.sources.binance_url, config.retry.clone())?;
            match client.test_connectivity().await {
                Ok(()) => {
                    info!("Binance reachable, sampling {} pairs per cycle", config.sources.venue_pairs);
                    Some(client)
                }
                Err(e) => {
                    warn!("Binance unreachable, exchange flows disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let source = LiveSource::new(coingecko, binance, config.sources.venue_pairs);
        run(source, &config, &args, etf_tickers, metrics).await
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(limit) = args.limit {
        config.monitor.limit = limit;
    }
    if let Some(interval) = args.interval {
        config.monitor.interval_secs = interval;
    }
    if args.demo {
        config.general.demo = true;
    }
    if let Some(seed) = args.seed {
        config.general.demo_seed = seed;
    }
    if args.metrics {
        config.metrics.enabled = true;
    }
}

fn load_etf_tickers(path: &Path) -> Result<Vec<EtfTicker>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ETF file {}", path.display()))?;
    let tickers: Vec<EtfTicker> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid ETF file {}", path.display()))?;
    info!("Loaded {} ETF records from {}", tickers.len(), path.display());
    Ok(tickers)
}

async fn run<S: MarketDataSource>(
    source: S,
    config: &Config,
    args: &Args,
    etf_tickers: Vec<EtfTicker>,
    metrics: Option<Arc<MonitorMetrics>>,
) -> Result<()> {
    let mut monitor = FlowMonitor::new(source, VenueClassifier::default(), config.monitor.limit)
        .with_etf_tickers(etf_tickers);
    if let Some(metrics) = &metrics {
        monitor = monitor.with_metrics(Arc::clone(metrics));
    }

    let emit = |report: &CycleReport| {
        if let Err(e) = print_report(report, args.json) {
            error!("Failed to print report: {:#}", e);
        }
        if let Some(metrics) = &metrics {
            match metrics.render() {
                Ok(text) => println!("{}", text),
                Err(e) => error!("Failed to render metrics: {:#}", e),
            }
        }
    };

    if args.continuous {
        monitor
            .run_continuous(
                Duration::from_secs(config.monitor.interval_secs),
                Duration::from_secs(config.monitor.error_backoff_secs),
                args.cycles,
                emit,
            )
            .await?;
    } else {
        match monitor.run_cycle().await {
            Ok(report) => emit(&report),
            Err(e) => {
                error!("{:#}", e);
                println!("no data available");
            }
        }
    }

    Ok(())
}

fn print_report(report: &CycleReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let mut out = String::new();
        write_cycle_report(&mut out, report)?;
        print!("{}", out);
    }
    Ok(())
}
