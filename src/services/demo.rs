//! Synthetic forecasts for running without a data provider key.
//!
//! Output is a random walk from a fixed base price and carries `demo_mode = true`.
//! Demo confidences are drawn from a bounded continuous range `[0.3, 0.9]` rather than
//! the four bands a live model produces.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::services::forecaster::Horizon;
use crate::types::{round2, ForecastSet, Prediction, TrainingReport};

/// Accuracy reported for every demo forecast.
pub const DEMO_MODEL_ACCURACY: f64 = 0.75;

const DEMO_TRAIN_SCORE: f64 = 0.85;
const DEMO_CHANGE_MEAN: f64 = 0.02;
const DEMO_CHANGE_STD: f64 = 0.03;
const DEMO_CONFIDENCE_MEAN: f64 = 0.7;
const DEMO_CONFIDENCE_STD: f64 = 0.1;

/// Largest single-step drop, keeping the walk positive.
const MAX_DROP: f64 = -0.5;

#[derive(Debug, Clone)]
pub struct DemoForecaster {
    base_price: f64,
}

impl DemoForecaster {
    pub fn new(base_price: f64) -> Self {
        Self { base_price }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn forecast(&self, symbol: &str, horizon: Horizon, now: DateTime<Utc>) -> ForecastSet {
        self.forecast_with_rng(symbol, horizon, now, &mut rand::thread_rng())
    }

    pub fn forecast_with_rng<R: Rng>(
        &self,
        symbol: &str,
        horizon: Horizon,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ForecastSet {
        let today = now.date_naive();
        let mut price = self.base_price;

        let predictions = (1..=horizon.days())
            .map(|step| {
                let z: f64 = rng.sample(StandardNormal);
                let change = (DEMO_CHANGE_MEAN + DEMO_CHANGE_STD * z).max(MAX_DROP);
                price *= 1.0 + change;

                let z: f64 = rng.sample(StandardNormal);
                let confidence = (DEMO_CONFIDENCE_MEAN + DEMO_CONFIDENCE_STD * z).clamp(0.3, 0.9);

                Prediction {
                    date: today + Duration::days(step as i64),
                    predicted_price: round2(price),
                    confidence,
                }
            })
            .collect();

        ForecastSet {
            symbol: symbol.to_string(),
            current_price: self.base_price,
            predictions,
            model_accuracy: DEMO_MODEL_ACCURACY,
            demo_mode: true,
            generated_at: now,
        }
    }

    /// Training stand-in. No provider is touched.
    pub fn training_report(&self, symbol: &str) -> TrainingReport {
        TrainingReport {
            symbol: symbol.to_string(),
            train_score: DEMO_TRAIN_SCORE,
            test_score: DEMO_MODEL_ACCURACY,
            train_rows: 0,
            test_rows: 0,
            model_info: "Demo mode: synthetic random walk, no model trained".to_string(),
            demo_mode: true,
        }
    }
}
