//! Prediction service.
//!
//! Owns the trained-model store and decides between live and demo output. Models are
//! immutable once stored; training for a symbol is serialized by a per-symbol lock
//! while forecasts only read `Arc<TrainedModel>`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{Config, ModelConfig};
use crate::error::{FitError, ForecastError};
use crate::services::demo::DemoForecaster;
use crate::services::features::FeatureBuilder;
use crate::services::forecaster::{Forecaster, Horizon};
use crate::services::summary::summarize;
use crate::services::trainer::{ModelTrainer, TrainedModel};
use crate::sources::SeriesProvider;
use crate::types::{
    ForecastSet, HistoricalSeries, ModelStatus, SummaryReport, TechnicalSeries, TrainingReport,
};

/// Runtime settings for the service, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub live_mode: bool,
    pub lookback_days: u32,
    pub upstream_timeout: Duration,
    pub training_timeout: Duration,
    pub auto_train: bool,
    pub model: ModelConfig,
    pub demo_base_price: f64,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            live_mode: config.live_mode,
            lookback_days: config.lookback_days,
            upstream_timeout: config.upstream_timeout(),
            training_timeout: config.training_timeout(),
            auto_train: config.auto_train,
            model: config.model.clone(),
            demo_base_price: config.demo_base_price,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            live_mode: true,
            lookback_days: 180,
            upstream_timeout: Duration::from_secs(15),
            training_timeout: Duration::from_secs(60),
            auto_train: true,
            model: ModelConfig::default(),
            demo_base_price: 150.0,
        }
    }
}

/// Symbols are case-insensitive.
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Trains, stores and serves per-symbol models.
pub struct PredictionService {
    features: FeatureBuilder,
    trainer: ModelTrainer,
    demo: DemoForecaster,
    settings: ServiceSettings,
    models: DashMap<String, Arc<TrainedModel>>,
    training_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PredictionService {
    pub fn new(provider: Arc<dyn SeriesProvider>, settings: ServiceSettings) -> Arc<Self> {
        Arc::new(Self {
            features: FeatureBuilder::new(provider, settings.upstream_timeout),
            trainer: ModelTrainer::from_config(&settings.model),
            demo: DemoForecaster::new(settings.demo_base_price),
            settings,
            models: DashMap::new(),
            training_locks: DashMap::new(),
        })
    }

    pub fn is_live(&self) -> bool {
        self.settings.live_mode
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Train (or retrain) the model for a symbol.
    pub async fn train(&self, symbol: &str) -> Result<TrainingReport, ForecastError> {
        let symbol = normalize_symbol(symbol);

        if !self.settings.live_mode {
            debug!("Demo mode: skipping training for {}", symbol);
            return Ok(self.demo.training_report(&symbol));
        }

        let guard = self.lock_for(&symbol).lock_owned().await;
        let model = self.train_locked(&symbol, guard).await?;

        Ok(TrainingReport {
            symbol,
            train_score: model.train_score,
            test_score: model.test_score,
            train_rows: model.train_rows,
            test_rows: model.test_rows,
            model_info: model.model_info(),
            demo_mode: false,
        })
    }

    /// Forecast `horizon` days ahead.
    pub async fn forecast(
        &self,
        symbol: &str,
        horizon: Horizon,
    ) -> Result<ForecastSet, ForecastError> {
        let symbol = normalize_symbol(symbol);

        if !self.settings.live_mode {
            return Ok(self.demo.forecast(&symbol, horizon, Utc::now()));
        }

        let model = match self.model(&symbol) {
            Some(model) => model,
            None if self.settings.auto_train => self.ensure_model(&symbol).await?,
            None => return Err(ForecastError::ModelNotTrained { symbol }),
        };

        let latest = self
            .features
            .latest_row(&symbol, self.settings.lookback_days)
            .await?;

        debug!(
            "Forecasting {} for {} days from close {:.2}",
            symbol,
            horizon.days(),
            latest.close
        );

        Forecaster::forecast(Some(&model), &symbol, &latest, horizon, Utc::now())
    }

    /// Seven-day forecast plus its summary.
    pub async fn summarize(&self, symbol: &str) -> Result<SummaryReport, ForecastError> {
        let forecast = self.forecast(symbol, Horizon::DEFAULT).await?;
        let summary = summarize(&forecast)?;
        Ok(SummaryReport::new(forecast, summary))
    }

    /// Normalized provider bars over the configured lookback.
    pub async fn history(&self, symbol: &str) -> Result<HistoricalSeries, ForecastError> {
        let symbol = self.live_symbol(symbol)?;
        let lookback_days = self.settings.lookback_days;
        let bars = self.features.fetch_bars(&symbol, lookback_days).await?;

        Ok(HistoricalSeries {
            symbol,
            provider: self.features.provider_name().to_string(),
            lookback_days,
            count: bars.len(),
            bars,
        })
    }

    /// Indicator values for every bar over the configured lookback.
    pub async fn technicals(&self, symbol: &str) -> Result<TechnicalSeries, ForecastError> {
        let symbol = self.live_symbol(symbol)?;
        self.features
            .technicals(&symbol, self.settings.lookback_days)
            .await
    }

    pub fn model(&self, symbol: &str) -> Option<Arc<TrainedModel>> {
        self.models
            .get(&normalize_symbol(symbol))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a stored model. Returns whether one existed.
    pub fn evict(&self, symbol: &str) -> bool {
        self.models.remove(&normalize_symbol(symbol)).is_some()
    }

    /// Stored models, ordered by symbol.
    pub fn trained_symbols(&self) -> Vec<ModelStatus> {
        let mut statuses: Vec<ModelStatus> = self
            .models
            .iter()
            .map(|entry| entry.value().status(entry.key()))
            .collect();
        statuses.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        statuses
    }

    /// Raw market data is never synthesized; demo mode refuses it.
    fn live_symbol(&self, symbol: &str) -> Result<String, ForecastError> {
        let symbol = normalize_symbol(symbol);
        if !self.settings.live_mode {
            return Err(ForecastError::LiveDataDisabled { symbol });
        }
        Ok(symbol)
    }

    fn lock_for(&self, symbol: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.training_locks.entry(symbol.to_string()).or_default().value())
    }

    /// Train once for a missing model; concurrent callers wait and reuse the result.
    async fn ensure_model(&self, symbol: &str) -> Result<Arc<TrainedModel>, ForecastError> {
        let guard = self.lock_for(symbol).lock_owned().await;

        if let Some(model) = self.model(symbol) {
            return Ok(model);
        }

        info!("No model for {}, training on demand", symbol);
        self.train_locked(symbol, guard).await
    }

    /// Build the frame and fit on the blocking pool.
    ///
    /// The symbol guard moves into the blocking task, so a fit abandoned by the
    /// timeout keeps the symbol locked until it actually returns.
    async fn train_locked(
        &self,
        symbol: &str,
        guard: OwnedMutexGuard<()>,
    ) -> Result<Arc<TrainedModel>, ForecastError> {
        let frame = self
            .features
            .build(symbol, self.settings.lookback_days)
            .await?;

        info!("Training model for {} on {} rows", symbol, frame.len());

        let trainer = self.trainer.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            trainer.train(&frame)
        });

        let model = match timeout(self.settings.training_timeout, handle).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                warn!("Training task for {} failed: {}", symbol, join_error);
                return Err(FitError::Aborted(join_error.to_string()).into());
            }
            Err(_) => {
                warn!(
                    "Training for {} exceeded {:?}; symbol stays locked until the fit returns",
                    symbol, self.settings.training_timeout
                );
                return Err(ForecastError::UpstreamTimeout {
                    symbol: symbol.to_string(),
                    timeout_ms: self.settings.training_timeout.as_millis() as u64,
                });
            }
        };

        info!(
            "Trained {}: train R² {:.4}, test R² {:.4}",
            symbol, model.train_score, model.test_score
        );

        let model = Arc::new(model);
        self.models.insert(symbol.to_string(), Arc::clone(&model));
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::services::indicators::tests::sample_bars;
    use crate::types::RawBar;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        bars: Vec<RawBar>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SeriesProvider for CountingProvider {
        async fn fetch_series(&self, _: &str, _: u32) -> Result<Vec<RawBar>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bars.clone())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn settings(live_mode: bool, auto_train: bool) -> ServiceSettings {
        ServiceSettings {
            live_mode,
            auto_train,
            model: ModelConfig {
                n_estimators: 10,
                ..ModelConfig::default()
            },
            ..ServiceSettings::default()
        }
    }

    fn service(
        bars: usize,
        settings: ServiceSettings,
    ) -> (Arc<PredictionService>, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            bars: sample_bars(bars),
            calls: AtomicUsize::new(0),
        });
        (PredictionService::new(provider.clone(), settings), provider)
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl "), "AAPL");
        assert_eq!(normalize_symbol("brk.b"), "BRK.B");
    }

    #[tokio::test]
    async fn test_train_stores_model() {
        let (service, _) = service(120, settings(true, true));
        let report = service.train("aapl").await.unwrap();

        assert_eq!(report.symbol, "AAPL");
        assert!(!report.demo_mode);
        assert_eq!(report.train_rows + report.test_rows, 70);
        assert!(service.model("AAPL").is_some());
        assert_eq!(service.trained_symbols().len(), 1);
    }

    #[tokio::test]
    async fn test_forecast_without_model_and_no_auto_train() {
        let (service, provider) = service(120, settings(true, false));
        let result = service.forecast("AAPL", Horizon::DEFAULT).await;

        assert!(matches!(result, Err(ForecastError::ModelNotTrained { .. })));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forecast_auto_trains_once() {
        let (service, provider) = service(120, settings(true, true));

        let first = service.forecast("AAPL", Horizon::DEFAULT).await.unwrap();
        let second = service.forecast("aapl", Horizon::new(3).unwrap()).await.unwrap();

        assert_eq!(first.horizon(), 7);
        assert_eq!(second.horizon(), 3);
        // one training fetch plus one latest-row fetch per forecast
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_evict_forces_retrain() {
        let (service, _) = service(120, settings(true, false));
        service.train("MSFT").await.unwrap();
        assert!(service.evict("msft"));
        assert!(!service.evict("msft"));
        assert!(service.model("MSFT").is_none());
    }

    #[tokio::test]
    async fn test_demo_mode_never_calls_provider() {
        let (service, provider) = service(120, settings(false, true));

        let report = service.train("AAPL").await.unwrap();
        assert!(report.demo_mode);

        let summary = service.summarize("AAPL").await.unwrap();
        assert!(summary.demo_mode);
        assert_eq!(summary.daily_predictions.len(), 7);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(service.trained_symbols().is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_fit_holds_symbol_lock() {
        let (service, _) = service(
            120,
            ServiceSettings {
                training_timeout: Duration::from_millis(1),
                model: ModelConfig {
                    n_estimators: 500,
                    ..ModelConfig::default()
                },
                ..settings(true, true)
            },
        );

        assert!(matches!(
            service.train("AAPL").await,
            Err(ForecastError::UpstreamTimeout { timeout_ms: 1, .. })
        ));

        // No second fit can start while the abandoned one runs
        let lock = service.lock_for("AAPL");
        assert!(lock.try_lock().is_err());

        // Released when the fit returns; its model is discarded
        drop(lock.lock().await);
        assert!(service.model("AAPL").is_none());
    }

    #[tokio::test]
    async fn test_lock_released_after_training() {
        let (service, _) = service(120, settings(true, false));
        service.train("AAPL").await.unwrap();
        assert!(service.lock_for("AAPL").try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_history_and_technicals() {
        let (service, provider) = service(80, settings(true, false));

        let history = service.history("msft").await.unwrap();
        assert_eq!(history.symbol, "MSFT");
        assert_eq!(history.provider, "counting");
        assert_eq!(history.count, 80);
        assert_eq!(history.bars.len(), 80);

        let technicals = service.technicals("msft").await.unwrap();
        assert_eq!(technicals.points.len(), 80);
        assert_eq!(technicals.warmup_bars, 49);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(service.trained_symbols().is_empty());
    }

    #[tokio::test]
    async fn test_market_data_refused_in_demo_mode() {
        let (service, provider) = service(80, settings(false, true));

        assert!(matches!(
            service.history("AAPL").await,
            Err(ForecastError::LiveDataDisabled { ref symbol }) if symbol == "AAPL"
        ));
        assert!(matches!(
            service.technicals("AAPL").await,
            Err(ForecastError::LiveDataDisabled { .. })
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_insufficient_history_surfaces() {
        let (service, _) = service(60, settings(true, true));
        assert!(matches!(
            service.train("AAPL").await,
            Err(ForecastError::InsufficientTrainingData { rows: 10, .. })
        ));
        assert!(service.model("AAPL").is_none());
    }
}
