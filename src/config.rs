use std::env;
use std::time::Duration;

/// API key values that count as "not configured".
const PLACEHOLDER_KEYS: &[&str] = &["demo_key", "demo", "your-api-key-here", "changeme"];

/// Market-data provider used for live series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataProvider {
    #[default]
    Yahoo,
    AlphaVantage,
}

impl DataProvider {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yahoo" | "yfinance" => Some(Self::Yahoo),
            "alphavantage" | "alpha_vantage" | "av" => Some(Self::AlphaVantage),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::AlphaVantage => "alphavantage",
        }
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Seed for the split shuffle and bootstrap sampling.
    pub seed: u64,
    /// Fraction of rows held out for scoring.
    pub test_fraction: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Alpha Vantage API key. Its presence gates live mode.
    pub alpha_vantage_api_key: Option<String>,
    /// Resolved once at startup: real data and models when true, demo output otherwise.
    pub live_mode: bool,
    /// Provider for historical bars.
    pub data_provider: DataProvider,
    /// Bar interval passed to the provider ("1d", "1h", ...).
    pub bar_interval: String,
    /// Calendar days of history to fetch.
    pub lookback_days: u32,
    /// Bound on a single provider call (ms).
    pub upstream_timeout_ms: u64,
    /// Bound on a single model fit (ms).
    pub training_timeout_ms: u64,
    /// Train on demand when a forecast finds no cached model.
    pub auto_train: bool,
    /// Model hyperparameters.
    pub model: ModelConfig,
    /// Starting price of the demo random walk.
    pub demo_base_price: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let alpha_vantage_api_key = env::var("ALPHA_VANTAGE_API_KEY").ok();
        let live_mode = Self::resolve_live_mode(alpha_vantage_api_key.as_deref());

        let defaults = ModelConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            alpha_vantage_api_key,
            live_mode,
            data_provider: env::var("DATA_PROVIDER")
                .ok()
                .and_then(|v| DataProvider::from_str(&v))
                .unwrap_or_default(),
            bar_interval: env::var("BAR_INTERVAL").unwrap_or_else(|_| "1d".to_string()),
            lookback_days: env::var("LOOKBACK_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(180),
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15_000),
            training_timeout_ms: env::var("TRAINING_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
            auto_train: env::var("AUTO_TRAIN")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            model: ModelConfig {
                n_estimators: env::var("MODEL_ESTIMATORS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.n_estimators),
                max_depth: env::var("MODEL_MAX_DEPTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_depth),
                seed: env::var("MODEL_SEED")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.seed),
                test_fraction: defaults.test_fraction,
            },
            demo_base_price: env::var("DEMO_BASE_PRICE")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|p| *p > 0.0)
                .unwrap_or(150.0),
        }
    }

    /// Live data requires a key that is present, non-empty and not a placeholder.
    pub fn resolve_live_mode(api_key: Option<&str>) -> bool {
        match api_key.map(str::trim) {
            None | Some("") => false,
            Some(key) => !PLACEHOLDER_KEYS
                .iter()
                .any(|placeholder| key.eq_ignore_ascii_case(placeholder)),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn training_timeout(&self) -> Duration {
        Duration::from_millis(self.training_timeout_ms)
    }
}
