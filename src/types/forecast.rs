use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One forecast step.
///
/// `confidence` is a coarse banded heuristic derived from the size of the predicted
/// move, not a statistical confidence interval. Live forecasts only ever produce
/// 0.3, 0.5, 0.7 or 0.9; demo forecasts sample a value in `[0.3, 0.9]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub confidence: f64,
}

/// A multi-day forecast for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub symbol: String,
    pub current_price: f64,
    pub predictions: Vec<Prediction>,
    /// R² of the model over its training frame.
    pub model_accuracy: f64,
    pub demo_mode: bool,
    pub generated_at: DateTime<Utc>,
}

impl ForecastSet {
    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }
}

/// Direction of the forecast average relative to the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// Bullish only when the average is strictly above the current price.
    pub fn from_prices(average: f64, current: f64) -> Self {
        if average > current {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
        }
    }
}

/// Aggregate view of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub average_prediction: f64,
    pub max_prediction: f64,
    pub min_prediction: f64,
    pub trend: Trend,
    /// Distance of the average from the current price, in percent.
    pub trend_strength: f64,
    /// Mean step confidence, in percent.
    pub confidence: f64,
}

/// Summary endpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub symbol: String,
    pub current_price: f64,
    pub prediction_summary: Summary,
    pub daily_predictions: Vec<Prediction>,
    pub model_accuracy: f64,
    pub demo_mode: bool,
}

impl SummaryReport {
    pub fn new(forecast: ForecastSet, summary: Summary) -> Self {
        Self {
            symbol: forecast.symbol,
            current_price: forecast.current_price,
            prediction_summary: summary,
            daily_predictions: forecast.predictions,
            model_accuracy: forecast.model_accuracy,
            demo_mode: forecast.demo_mode,
        }
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub symbol: String,
    pub train_score: f64,
    pub test_score: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub model_info: String,
    pub demo_mode: bool,
}

/// Listing entry for a cached model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub symbol: String,
    pub train_score: f64,
    pub test_score: f64,
    pub trained_at: DateTime<Utc>,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
