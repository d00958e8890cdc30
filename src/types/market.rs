use serde::{Deserialize, Serialize};

use super::{FeatureRow, RawBar};

/// Normalized provider history for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub symbol: String,
    pub provider: String,
    pub lookback_days: u32,
    pub count: usize,
    pub bars: Vec<RawBar>,
}

/// Indicator values for one bar. `indicators` is `None` during warm-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalPoint {
    pub timestamp: i64,
    pub close: f64,
    pub indicators: Option<FeatureRow>,
}

/// Per-bar indicator series for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSeries {
    pub symbol: String,
    /// Leading bars without a complete indicator row.
    pub warmup_bars: usize,
    pub points: Vec<TechnicalPoint>,
}

impl TechnicalSeries {
    pub fn new(symbol: String, bars: &[RawBar], rows: Vec<Option<FeatureRow>>) -> Self {
        let warmup_bars = rows.iter().take_while(|row| row.is_none()).count();
        let points = bars
            .iter()
            .zip(rows)
            .map(|(bar, indicators)| TechnicalPoint {
                timestamp: bar.timestamp,
                close: bar.close,
                indicators,
            })
            .collect();

        Self {
            symbol,
            warmup_bars,
            points,
        }
    }

    /// The most recent complete row, if any bar survived warm-up.
    pub fn latest(&self) -> Option<&FeatureRow> {
        self.points.iter().rev().find_map(|p| p.indicators.as_ref())
    }
}
