//! Stock prediction endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::Horizon;
use crate::types::{
    ForecastSet, HistoricalSeries, ModelStatus, SummaryReport, TechnicalSeries, TrainingReport,
};
use crate::AppState;

/// Query parameters for the predictions endpoint.
#[derive(Debug, Deserialize)]
pub struct PredictionsQuery {
    /// Days ahead to forecast, 1 to 30. Defaults to 7. Parsed by [`Self::horizon`].
    pub days: Option<String>,
}

impl PredictionsQuery {
    pub fn horizon(&self) -> Result<Horizon> {
        let raw = match self.days.as_deref().map(str::trim) {
            None | Some("") => return Ok(Horizon::DEFAULT),
            Some(raw) => raw,
        };

        let days = raw.parse::<usize>().map_err(|_| {
            AppError::BadRequest(format!(
                "days must be an integer between 1 and {}, got {:?}",
                Horizon::MAX,
                raw
            ))
        })?;

        Ok(Horizon::new(days)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelStatus>,
    pub count: usize,
    pub demo_mode: bool,
}

/// Create the stocks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/train/:symbol", post(train_model))
        .route("/predictions/:symbol", get(get_predictions))
        .route("/prediction-summary/:symbol", get(get_prediction_summary))
        .route("/models", get(list_models))
        .route("/historical/:symbol", get(get_historical))
        .route("/technical/:symbol", get(get_technical))
}

/// Train or retrain the model for a symbol.
async fn train_model(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<TrainingReport>> {
    let report = state.prediction_service.train(&symbol).await?;
    Ok(Json(report))
}

/// Forecast the next `days` closes.
async fn get_predictions(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<PredictionsQuery>,
) -> Result<Json<ForecastSet>> {
    let horizon = query.horizon()?;
    debug!("Predictions requested for {} ({} days)", symbol, horizon.days());

    let forecast = state.prediction_service.forecast(&symbol, horizon).await?;
    Ok(Json(forecast))
}

/// Seven-day forecast with aggregate trend.
async fn get_prediction_summary(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<SummaryReport>> {
    let report = state.prediction_service.summarize(&symbol).await?;
    Ok(Json(report))
}

/// Normalized daily bars from the configured provider.
async fn get_historical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<HistoricalSeries>> {
    let series = state.prediction_service.history(&symbol).await?;
    Ok(Json(series))
}

/// Indicator values per bar.
async fn get_technical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<TechnicalSeries>> {
    let series = state.prediction_service.technicals(&symbol).await?;
    Ok(Json(series))
}

/// Models currently held in memory.
async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.prediction_service.trained_symbols();
    Json(ModelsResponse {
        count: models.len(),
        models,
        demo_mode: !state.prediction_service.is_live(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    fn query(days: Option<&str>) -> PredictionsQuery {
        PredictionsQuery {
            days: days.map(str::to_string),
        }
    }

    #[test]
    fn test_query_default_horizon() {
        assert_eq!(query(None).horizon().unwrap().days(), 7);
        assert_eq!(query(Some("")).horizon().unwrap().days(), 7);
        assert_eq!(query(Some(" 12 ")).horizon().unwrap().days(), 12);
    }

    #[test]
    fn test_query_rejects_out_of_range() {
        for days in ["0", "31", "365"] {
            assert!(matches!(
                query(Some(days)).horizon(),
                Err(AppError::Forecast(ForecastError::InvalidHorizon { .. }))
            ));
        }
    }

    #[test]
    fn test_query_rejects_malformed_days() {
        for days in ["week", "-1", "2.5"] {
            match query(Some(days)).horizon() {
                Err(AppError::BadRequest(message)) => {
                    assert!(message.contains("between 1 and 30"), "{message}");
                }
                other => panic!("unexpected result for {days}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_models_response_serialization() {
        let response = ModelsResponse {
            models: Vec::new(),
            count: 0,
            demo_mode: true,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"models":[],"count":0,"demo_mode":true}"#);
    }
}
