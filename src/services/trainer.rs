//! Model training.
//!
//! A [`TrainedModel`] is immutable once built: the fitted scaler, the forest and its
//! scores travel together, and the service shares it behind an `Arc`.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::ModelConfig;
use crate::error::{FitError, ForecastError};
use crate::services::forest::{r2_score, ForestParams, RandomForest};
use crate::services::scaler::StandardScaler;
use crate::types::{ModelStatus, TrainingFrame, FEATURE_COUNT};

/// A fitted scaler and forest with their scores.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    scaler: StandardScaler,
    forest: RandomForest,
    pub train_score: f64,
    pub test_score: f64,
    /// R² over every labelled row of the frame.
    pub frame_score: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Scale one raw feature vector and predict the next close.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.forest.predict(&self.scaler.transform(features))
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn model_info(&self) -> String {
        let params = self.forest.params();
        format!(
            "RandomForestRegressor(n_estimators={}, max_depth={}, seed={})",
            params.n_estimators, params.max_depth, params.seed
        )
    }

    pub fn status(&self, symbol: &str) -> ModelStatus {
        ModelStatus {
            symbol: symbol.to_string(),
            train_score: self.train_score,
            test_score: self.test_score,
            trained_at: self.trained_at,
        }
    }
}

/// Fits a [`TrainedModel`] from a [`TrainingFrame`].
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    params: ForestParams,
    test_fraction: f64,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

impl ModelTrainer {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            params: ForestParams {
                n_estimators: config.n_estimators,
                max_depth: config.max_depth,
                seed: config.seed,
                ..ForestParams::default()
            },
            test_fraction: config.test_fraction,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Shuffled row indices split into (train, test).
    ///
    /// The test side holds `ceil(test_fraction * n)` rows.
    pub fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        indices.shuffle(&mut rng);

        let test_rows = ((n as f64) * self.test_fraction).ceil() as usize;
        let test = indices.split_off(n - test_rows.min(n));
        (indices, test)
    }

    /// Fit and score. CPU-bound; callers on the async runtime should run this on a
    /// blocking thread.
    pub fn train(&self, frame: &TrainingFrame) -> Result<TrainedModel, ForecastError> {
        if frame.len() < TrainingFrame::MIN_ROWS {
            return Err(ForecastError::InsufficientTrainingData {
                rows: frame.len(),
                required: TrainingFrame::MIN_ROWS,
            });
        }

        let features = frame.features();
        let targets = frame.targets();
        if features.len() != targets.len() {
            return Err(FitError::ShapeMismatch {
                rows: features.len(),
                targets: targets.len(),
            }
            .into());
        }

        let (train_idx, test_idx) = self.split(features.len());
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(FitError::EmptyInput.into());
        }

        let pick = |idx: &[usize]| -> (Vec<[f64; FEATURE_COUNT]>, Vec<f64>) {
            idx.iter().map(|&i| (features[i], targets[i])).unzip()
        };
        let (x_train, y_train) = pick(&train_idx);
        let (x_test, y_test) = pick(&test_idx);

        let scaler = StandardScaler::fit(&x_train)?;
        let x_train = scaler.transform_all(&x_train);
        let x_test = scaler.transform_all(&x_test);

        let forest = RandomForest::fit(&x_train, &y_train, self.params)?;

        let train_score = r2_score(&y_train, &forest.predict_all(&x_train));
        let test_score = r2_score(&y_test, &forest.predict_all(&x_test));
        let frame_score = r2_score(&targets, &forest.predict_all(&scaler.transform_all(&features)));

        Ok(TrainedModel {
            scaler,
            forest,
            train_score,
            test_score,
            frame_score,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            trained_at: Utc::now(),
        })
    }
}
