use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure reported by a market-data provider.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(u16),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Empty series")]
    Empty,
}

/// Numerical failure while fitting or applying a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("no rows to fit")]
    EmptyInput,

    #[error("feature matrix has {rows} rows but {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("non-finite value in row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("fit aborted: {0}")]
    Aborted(String),
}

/// Prediction pipeline failures.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("No data available for {symbol}: {reason}")]
    NoDataAvailable { symbol: String, reason: String },

    #[error("Insufficient history: {bars} bars, indicators need at least {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("Insufficient data for training: {rows} rows, need {required}")]
    InsufficientTrainingData { rows: usize, required: usize },

    #[error("Training failed: {0}")]
    TrainingFailed(#[from] FitError),

    #[error("No trained model for {symbol}")]
    ModelNotTrained { symbol: String },

    #[error("Upstream call for {symbol} exceeded {timeout_ms}ms")]
    UpstreamTimeout { symbol: String, timeout_ms: u64 },

    #[error("No predictions available")]
    EmptyForecast,

    #[error("Forecast horizon must be between 1 and {max}, got {requested}")]
    InvalidHorizon { requested: usize, max: usize },

    #[error("Live market data for {symbol} needs a configured provider key")]
    LiveDataDisabled { symbol: String },
}

impl ForecastError {
    /// Map a provider failure onto the taxonomy.
    pub fn no_data(symbol: &str, source: SourceError) -> Self {
        ForecastError::NoDataAvailable {
            symbol: symbol.to_string(),
            reason: source.to_string(),
        }
    }

    /// HTTP status used when surfacing this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForecastError::NoDataAvailable { .. } => StatusCode::NOT_FOUND,
            ForecastError::InsufficientHistory { .. }
            | ForecastError::InsufficientTrainingData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ForecastError::TrainingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForecastError::ModelNotTrained { .. } => StatusCode::CONFLICT,
            ForecastError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ForecastError::EmptyForecast => StatusCode::INTERNAL_SERVER_ERROR,
            ForecastError::InvalidHorizon { .. } => StatusCode::BAD_REQUEST,
            ForecastError::LiveDataDisabled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forecast(e) => (e.status_code(), e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ForecastError::NoDataAvailable {
                    symbol: "AAPL".into(),
                    reason: "Empty series".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ForecastError::InsufficientTrainingData { rows: 10, required: 30 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ForecastError::ModelNotTrained { symbol: "AAPL".into() },
                StatusCode::CONFLICT,
            ),
            (
                ForecastError::UpstreamTimeout {
                    symbol: "AAPL".into(),
                    timeout_ms: 10,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ForecastError::InvalidHorizon { requested: 31, max: 30 },
                StatusCode::BAD_REQUEST,
            ),
            (
                ForecastError::TrainingFailed(FitError::EmptyInput),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ForecastError::LiveDataDisabled { symbol: "AAPL".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{}", error);
        }
    }

    #[test]
    fn test_training_failed_keeps_cause() {
        let error: ForecastError = FitError::NonFinite { row: 3, column: 7 }.into();
        assert_eq!(
            error.to_string(),
            "Training failed: non-finite value in row 3, column 7"
        );
        let source = std::error::Error::source(&error).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("non-finite value in row 3, column 7"));
    }

    #[test]
    fn test_no_data_from_source_error() {
        let error = ForecastError::no_data("MSFT", SourceError::Status(503));
        assert_eq!(error.to_string(), "No data available for MSFT: API error: 503");
    }

    #[test]
    fn test_app_error_response_status() {
        let response = AppError::from(ForecastError::EmptyForecast).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::BadRequest("days".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
