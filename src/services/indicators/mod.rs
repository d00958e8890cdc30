//! Indicator engine.
//!
//! Turns an ordered OHLCV series into [`FeatureRow`]s. Each indicator produces a
//! series aligned with the input where `None` marks an unsatisfied warm-up window;
//! a bar becomes a row only when every indicator is defined.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use returns::{PriceChange, Volatility};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::error::ForecastError;
use crate::types::{FeatureRow, RawBar};

/// Standard deviation around `mean` with `ddof` delta degrees of freedom.
pub(crate) fn std_dev(values: &[f64], mean: f64, ddof: usize) -> f64 {
    if values.len() <= ddof {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - ddof) as f64).sqrt()
}

/// Computes the fixed indicator set for every bar.
pub struct IndicatorEngine {
    sma_fast: Sma,
    sma_slow: Sma,
    ema_fast: Ema,
    ema_slow: Ema,
    macd: Macd,
    rsi: Rsi,
    bollinger: BollingerBands,
    volume_sma: Sma,
    change_1: PriceChange,
    change_5: PriceChange,
    change_10: PriceChange,
    volatility: Volatility,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            sma_fast: Sma::new(20),
            sma_slow: Sma::new(50),
            ema_fast: Ema::new(12),
            ema_slow: Ema::new(26),
            macd: Macd::default(),
            rsi: Rsi::default(),
            bollinger: BollingerBands::default(),
            volume_sma: Sma::new(20),
            change_1: PriceChange::new(1),
            change_5: PriceChange::new(5),
            change_10: PriceChange::new(10),
            volatility: Volatility::default(),
        }
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bars needed before the first complete row.
    pub fn min_periods(&self) -> usize {
        [
            self.sma_fast.min_periods(),
            self.sma_slow.min_periods(),
            self.ema_fast.min_periods(),
            self.ema_slow.min_periods(),
            self.macd.min_periods(),
            self.rsi.min_periods(),
            self.bollinger.min_periods(),
            self.volume_sma.min_periods(),
            self.change_1.min_periods(),
            self.change_5.min_periods(),
            self.change_10.min_periods(),
            self.volatility.min_periods(),
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    /// One entry per bar; `None` where any indicator is still warming up.
    pub fn annotate(&self, bars: &[RawBar]) -> Vec<Option<FeatureRow>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let sma_20 = self.sma_fast.calculate(&closes);
        let sma_50 = self.sma_slow.calculate(&closes);
        let ema_12 = self.ema_fast.calculate(&closes);
        let ema_26 = self.ema_slow.calculate(&closes);
        let macd = self.macd.calculate(&closes);
        let rsi = self.rsi.calculate(&closes);
        let bands = self.bollinger.calculate(&closes);
        let volume_sma = self.volume_sma.calculate(&volumes);
        let change_1 = self.change_1.calculate(&closes);
        let change_5 = self.change_5.calculate(&closes);
        let change_10 = self.change_10.calculate(&closes);
        let volatility = self.volatility.calculate(&closes);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let row = FeatureRow {
                    timestamp: bar.timestamp,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                    sma_20: sma_20[i]?,
                    sma_50: sma_50[i]?,
                    ema_12: ema_12[i]?,
                    ema_26: ema_26[i]?,
                    macd: macd.line[i]?,
                    macd_signal: macd.signal[i]?,
                    rsi: rsi[i]?,
                    bb_upper: bands.upper[i]?,
                    bb_lower: bands.lower[i]?,
                    bb_middle: bands.middle[i]?,
                    volume_sma: volume_sma[i]?,
                    price_change: change_1[i]?,
                    price_change_5: change_5[i]?,
                    price_change_10: change_10[i]?,
                    volatility: volatility[i]?,
                    target: None,
                };

                row.feature_vector()
                    .iter()
                    .all(|v| v.is_finite())
                    .then_some(row)
            })
            .collect()
    }

    /// Complete rows only. Fails when no bar survives warm-up.
    pub fn compute(&self, bars: &[RawBar]) -> Result<Vec<FeatureRow>, ForecastError> {
        let rows: Vec<FeatureRow> = self.annotate(bars).into_iter().flatten().collect();

        if rows.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                bars: bars.len(),
                required: self.min_periods(),
            });
        }

        Ok(rows)
    }
}
