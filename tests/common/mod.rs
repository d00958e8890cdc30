//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use foresight::config::{Config, DataProvider, ModelConfig};
use foresight::error::SourceError;
use foresight::services::{PredictionService, ServiceSettings};
use foresight::sources::SeriesProvider;
use foresight::types::RawBar;
use foresight::AppState;

/// Deterministic daily series: gentle uptrend with two overlaid cycles.
pub fn trending_bars(count: usize) -> Vec<RawBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 50.0 + t * 0.2 + (t * 0.35).sin() * 3.0 + (t * 0.05).cos() * 1.5;
            RawBar {
                timestamp: 1_704_067_200_000 + i as i64 * 86_400_000,
                open: close - 0.4,
                high: close + 1.2,
                low: close - 1.2,
                close,
                volume: 500_000.0 + (t * 0.7).cos().abs() * 100_000.0,
            }
        })
        .collect()
}

/// Provider serving a fixed series and counting calls.
pub struct StubProvider {
    bars: Vec<RawBar>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(bars: Vec<RawBar>) -> Arc<Self> {
        Self::with_delay(bars, Duration::ZERO)
    }

    pub fn with_delay(bars: Vec<RawBar>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            bars,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeriesProvider for StubProvider {
    async fn fetch_series(&self, symbol: &str, _: u32) -> Result<Vec<RawBar>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if symbol == "NODATA" || self.bars.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(self.bars.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn settings(live_mode: bool, auto_train: bool) -> ServiceSettings {
    ServiceSettings {
        live_mode,
        auto_train,
        model: ModelConfig {
            n_estimators: 15,
            ..ModelConfig::default()
        },
        ..ServiceSettings::default()
    }
}

pub fn config(live_mode: bool) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        alpha_vantage_api_key: live_mode.then(|| "TESTKEY".to_string()),
        live_mode,
        data_provider: DataProvider::Yahoo,
        bar_interval: "1d".to_string(),
        lookback_days: 180,
        upstream_timeout_ms: 15_000,
        training_timeout_ms: 60_000,
        auto_train: true,
        model: ModelConfig::default(),
        demo_base_price: 150.0,
    }
}

pub fn state(provider: Arc<StubProvider>, settings: ServiceSettings) -> AppState {
    AppState {
        config: Arc::new(config(settings.live_mode)),
        prediction_service: PredictionService::new(provider, settings),
    }
}
