//! Feature building: provider history in, labelled frame out.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ForecastError;
use crate::services::indicators::IndicatorEngine;
use crate::sources::SeriesProvider;
use crate::types::{normalize_series, FeatureRow, RawBar, TechnicalSeries, TrainingFrame};

/// Label indicator rows with the next row's close and drop the unlabelled tail.
pub fn label_rows(mut rows: Vec<FeatureRow>) -> TrainingFrame {
    let next_closes: Vec<f64> = rows.iter().skip(1).map(|r| r.close).collect();
    for (row, next_close) in rows.iter_mut().zip(next_closes) {
        row.target = Some(next_close);
    }
    rows.pop();
    TrainingFrame::new(rows)
}

/// Indicators plus labelling over an in-memory series.
pub fn frame_from_bars(bars: &[RawBar]) -> Result<TrainingFrame, ForecastError> {
    let rows = IndicatorEngine::new().compute(bars)?;
    let frame = label_rows(rows);

    if frame.len() < TrainingFrame::MIN_ROWS {
        return Err(ForecastError::InsufficientTrainingData {
            rows: frame.len(),
            required: TrainingFrame::MIN_ROWS,
        });
    }

    Ok(frame)
}

/// Pulls history through a [`SeriesProvider`] and derives feature rows from it.
pub struct FeatureBuilder {
    provider: Arc<dyn SeriesProvider>,
    engine: IndicatorEngine,
    upstream_timeout: Duration,
}

impl FeatureBuilder {
    pub fn new(provider: Arc<dyn SeriesProvider>, upstream_timeout: Duration) -> Self {
        Self {
            provider,
            engine: IndicatorEngine::new(),
            upstream_timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch and normalize bars, bounded by the upstream timeout.
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, ForecastError> {
        let fetch = self.provider.fetch_series(symbol, lookback_days);
        let bars = match timeout(self.upstream_timeout, fetch).await {
            Ok(Ok(bars)) => normalize_series(bars),
            Ok(Err(e)) => {
                warn!(symbol, provider = self.provider.name(), "Series fetch failed: {}", e);
                return Err(ForecastError::no_data(symbol, e));
            }
            Err(_) => {
                warn!(symbol, provider = self.provider.name(), "Series fetch timed out");
                return Err(ForecastError::UpstreamTimeout {
                    symbol: symbol.to_string(),
                    timeout_ms: self.upstream_timeout.as_millis() as u64,
                });
            }
        };

        if bars.is_empty() {
            return Err(ForecastError::NoDataAvailable {
                symbol: symbol.to_string(),
                reason: "provider returned no usable bars".to_string(),
            });
        }

        debug!(symbol, bars = bars.len(), "Fetched series");
        Ok(bars)
    }

    /// Every complete indicator row for the symbol, oldest first.
    pub async fn rows(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<FeatureRow>, ForecastError> {
        let bars = self.fetch_bars(symbol, lookback_days).await?;
        self.engine.compute(&bars)
    }

    /// Indicator values aligned with every fetched bar, warm-up included.
    pub async fn technicals(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<TechnicalSeries, ForecastError> {
        let bars = self.fetch_bars(symbol, lookback_days).await?;
        let rows = self.engine.annotate(&bars);
        Ok(TechnicalSeries::new(symbol.to_string(), &bars, rows))
    }

    /// Labelled training frame for the symbol.
    pub async fn build(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<TrainingFrame, ForecastError> {
        let bars = self.fetch_bars(symbol, lookback_days).await?;
        let frame = frame_from_bars(&bars)?;
        debug!(symbol, rows = frame.len(), "Built training frame");
        Ok(frame)
    }

    /// Most recent complete row, used as the forecast seed.
    pub async fn latest_row(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<FeatureRow, ForecastError> {
        let mut rows = self.rows(symbol, lookback_days).await?;
        rows.pop().ok_or_else(|| ForecastError::InsufficientHistory {
            bars: 0,
            required: self.engine.min_periods(),
        })
    }
}
