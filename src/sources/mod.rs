//! Historical bar providers.

pub mod alphavantage;
pub mod yahoo;

pub use alphavantage::AlphaVantageClient;
pub use yahoo::YahooFinanceClient;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, DataProvider};
use crate::error::SourceError;
use crate::types::RawBar;

/// Source of daily OHLCV history.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Bars covering roughly the last `lookback_days` calendar days, oldest first.
    async fn fetch_series(&self, symbol: &str, lookback_days: u32)
        -> Result<Vec<RawBar>, SourceError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn SeriesProvider>, SourceError> {
    let provider: Arc<dyn SeriesProvider> = match config.data_provider {
        DataProvider::Yahoo => Arc::new(YahooFinanceClient::new(
            config.bar_interval.clone(),
            config.upstream_timeout(),
        )?),
        DataProvider::AlphaVantage => Arc::new(AlphaVantageClient::new(
            config.alpha_vantage_api_key.clone().unwrap_or_default(),
            config.upstream_timeout(),
        )?),
    };
    Ok(provider)
}
