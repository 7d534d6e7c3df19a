use crate::exchange::RetryPolicy;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `TOKEN_FLOW__MONITOR__LIMIT=50`
const ENV_PREFIX: &str = "TOKEN_FLOW";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
    pub retry: RetryPolicy,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub environment: String,
    pub demo: bool,  // use synthetic data instead of live APIs
    pub demo_seed: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            demo: false,
            demo_seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub coingecko_url: String,
    pub coingecko_api_key: Option<String>,
    pub binance_url: String,
    pub binance_enabled: bool,
    pub venue_pairs: usize,  // top tokens sampled on Binance per cycle
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            coingecko_url: crate::exchange::coingecko::rest::DEFAULT_BASE_URL.to_string(),
            coingecko_api_key: None,
            binance_url: crate::exchange::binance::rest::DEFAULT_BASE_URL.to_string(),
            binance_enabled: true,
            venue_pairs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub limit: usize,
    pub interval_secs: u64,
    pub error_backoff_secs: u64,
    pub etf_file: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            interval_secs: 3600,
            error_backoff_secs: 60,
            etf_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,  // "pretty" or "json"
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then the optional file, then environment overrides
    ///
    /// `.env` is read first. The file path comes from the argument,
    /// else `CONFIG_FILE`, else `config/default.toml`; a missing file is
    /// not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CONFIG_FILE").ok().map(Into::into))
            .unwrap_or_else(|| "config/default.toml".into());
        debug!("Loading config from {}", path.display());

        let layered = ::config::Config::builder()
            .add_source(::config::File::from(path.as_path()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to layer configuration")?;

        let mut config: Config = layered
            .try_deserialize()
            .context("Invalid configuration")?;

        // Conventional variable name for the API key
        if config.sources.coingecko_api_key.is_none() {
            config.sources.coingecko_api_key = std::env::var("COINGECKO_API_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.sources.coingecko_url).context("sources.coingecko_url")?;
        url::Url::parse(&self.sources.binance_url).context("sources.binance_url")?;

        ensure!(
            (1..=250).contains(&self.monitor.limit),
            "monitor.limit must be between 1 and 250"
        );
        ensure!(self.monitor.interval_secs > 0, "monitor.interval_secs must be positive");
        ensure!(self.retry.max_attempts > 0, "retry.max_attempts must be positive");
        ensure!(
            matches!(self.logging.output.as_str(), "pretty" | "json"),
            "logging.output must be \"pretty\" or \"json\""
        );

        Ok(())
    }
}
