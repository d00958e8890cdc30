//! Autoregressive multi-step forecasting.

use chrono::{DateTime, Duration, Utc};

use crate::error::ForecastError;
use crate::services::trainer::TrainedModel;
use crate::types::{round2, FeatureRow, ForecastSet, Prediction, CLOSE_INDEX};

/// A validated number of forecast days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon(usize);

impl Horizon {
    pub const MAX: usize = 30;
    pub const DEFAULT: Horizon = Horizon(7);

    pub fn new(days: usize) -> Result<Self, ForecastError> {
        if (1..=Self::MAX).contains(&days) {
            Ok(Self(days))
        } else {
            Err(ForecastError::InvalidHorizon {
                requested: days,
                max: Self::MAX,
            })
        }
    }

    pub fn days(self) -> usize {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Banded confidence from the relative size of a predicted move.
pub fn confidence_for_change(predicted: f64, reference: f64) -> f64 {
    let change = ((predicted - reference) / reference).abs();
    if change < 0.05 {
        0.9
    } else if change < 0.10 {
        0.7
    } else if change < 0.20 {
        0.5
    } else {
        0.3
    }
}

/// Rolls a trained model forward one day at a time.
///
/// Each prediction replaces only the close column of the working vector; every other
/// feature is carried forward from the last observed row.
#[derive(Debug, Default, Clone, Copy)]
pub struct Forecaster;

impl Forecaster {
    pub fn forecast(
        model: Option<&TrainedModel>,
        symbol: &str,
        latest: &FeatureRow,
        horizon: Horizon,
        now: DateTime<Utc>,
    ) -> Result<ForecastSet, ForecastError> {
        let model = model.ok_or_else(|| ForecastError::ModelNotTrained {
            symbol: symbol.to_string(),
        })?;

        let today = now.date_naive();
        let mut features = latest.feature_vector();
        let mut reference = latest.close;
        let mut predictions = Vec::with_capacity(horizon.days());

        for step in 1..=horizon.days() {
            let predicted = model.predict(&features);

            predictions.push(Prediction {
                date: today + Duration::days(step as i64),
                predicted_price: round2(predicted),
                confidence: confidence_for_change(predicted, reference),
            });

            features[CLOSE_INDEX] = predicted;
            reference = predicted;
        }

        Ok(ForecastSet {
            symbol: symbol.to_string(),
            current_price: latest.close,
            predictions,
            model_accuracy: model.frame_score,
            demo_mode: false,
            generated_at: now,
        })
    }
}
