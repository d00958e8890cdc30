pub mod demo;
pub mod features;
pub mod forecaster;
pub mod forest;
pub mod indicators;
pub mod prediction;
pub mod scaler;
pub mod summary;
pub mod trainer;

pub use demo::DemoForecaster;
pub use features::{frame_from_bars, label_rows, FeatureBuilder};
pub use forecaster::{confidence_for_change, Forecaster, Horizon};
pub use forest::{r2_score, ForestParams, RandomForest, RegressionTree};
pub use indicators::IndicatorEngine;
pub use prediction::{PredictionService, ServiceSettings};
pub use scaler::StandardScaler;
pub use summary::summarize;
pub use trainer::{ModelTrainer, TrainedModel};
