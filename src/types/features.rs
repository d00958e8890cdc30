use serde::{Deserialize, Serialize};

use super::RawBar;

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 20;

/// Position of the close price inside a feature vector.
pub const CLOSE_INDEX: usize = 3;

/// Model input columns, in vector order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "open",
    "high",
    "low",
    "close",
    "volume",
    "sma_20",
    "sma_50",
    "ema_12",
    "ema_26",
    "macd",
    "macd_signal",
    "rsi",
    "bb_upper",
    "bb_lower",
    "bb_middle",
    "volume_sma",
    "price_change",
    "price_change_5",
    "price_change_10",
    "volatility",
];

/// A bar with every indicator defined.
///
/// `macd` holds the raw MACD line (EMA12 - EMA26) and `macd_signal` its 9-period EMA.
/// The divergence between them is available through [`FeatureRow::macd_histogram`] and
/// is not a model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub ema_12: f64,
    pub ema_26: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub rsi: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub bb_middle: f64,
    pub volume_sma: f64,
    pub price_change: f64,
    pub price_change_5: f64,
    pub price_change_10: f64,
    pub volatility: f64,
    /// Next period's close. Absent on the most recent row.
    pub target: Option<f64>,
}

impl FeatureRow {
    /// The bar this row was derived from.
    pub fn bar(&self) -> RawBar {
        RawBar {
            timestamp: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }

    /// MACD line minus signal line.
    pub fn macd_histogram(&self) -> f64 {
        self.macd - self.macd_signal
    }

    /// Model inputs in [`FEATURE_COLUMNS`] order.
    pub fn feature_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.sma_20,
            self.sma_50,
            self.ema_12,
            self.ema_26,
            self.macd,
            self.macd_signal,
            self.rsi,
            self.bb_upper,
            self.bb_lower,
            self.bb_middle,
            self.volume_sma,
            self.price_change,
            self.price_change_5,
            self.price_change_10,
            self.volatility,
        ]
    }
}

/// Labelled rows ready for training. Every row carries a target.
#[derive(Debug, Clone)]
pub struct TrainingFrame {
    rows: Vec<FeatureRow>,
}

impl TrainingFrame {
    /// Minimum number of labelled rows needed to train.
    pub const MIN_ROWS: usize = 30;

    /// Wrap labelled rows. Rows without a target are discarded.
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self {
            rows: rows.into_iter().filter(|r| r.target.is_some()).collect(),
        }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix, one vector per row.
    pub fn features(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.rows.iter().map(FeatureRow::feature_vector).collect()
    }

    /// Target column.
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.target).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(close: f64, target: Option<f64>) -> FeatureRow {
        FeatureRow {
            timestamp: 0,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close,
            volume: 100.0,
            sma_20: 5.0,
            sma_50: 6.0,
            ema_12: 7.0,
            ema_26: 8.0,
            macd: 1.5,
            macd_signal: 1.0,
            rsi: 55.0,
            bb_upper: 9.0,
            bb_lower: 3.0,
            bb_middle: 6.0,
            volume_sma: 90.0,
            price_change: 0.01,
            price_change_5: 0.02,
            price_change_10: 0.03,
            volatility: 0.015,
            target,
        }
    }

    #[test]
    fn test_feature_vector_order_matches_columns() {
        let vector = row(42.0, None).feature_vector();
        assert_eq!(vector.len(), FEATURE_COLUMNS.len());
        assert_eq!(FEATURE_COLUMNS[CLOSE_INDEX], "close");
        assert_eq!(vector[CLOSE_INDEX], 42.0);
        assert_eq!(vector[9], 1.5);
        assert_eq!(vector[10], 1.0);
        assert_eq!(vector[19], 0.015);
    }

    #[test]
    fn test_macd_histogram() {
        assert!((row(1.0, None).macd_histogram() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_training_frame_drops_unlabelled_rows() {
        let frame = TrainingFrame::new(vec![row(1.0, Some(2.0)), row(2.0, None), row(3.0, Some(4.0))]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.targets(), vec![2.0, 4.0]);
        assert_eq!(frame.features().len(), 2);
    }
}
