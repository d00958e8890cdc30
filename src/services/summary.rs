use crate::error::ForecastError;
use crate::types::{round2, ForecastSet, Summary, Trend};

/// Aggregate a forecast into averages, extremes and a trend call.
pub fn summarize(forecast: &ForecastSet) -> Result<Summary, ForecastError> {
    if forecast.predictions.is_empty() {
        return Err(ForecastError::EmptyForecast);
    }

    let count = forecast.predictions.len() as f64;
    let prices = forecast.predictions.iter().map(|p| p.predicted_price);

    let average = prices.clone().sum::<f64>() / count;
    let max = prices.clone().fold(f64::NEG_INFINITY, f64::max);
    let min = prices.fold(f64::INFINITY, f64::min);
    let confidence = forecast.predictions.iter().map(|p| p.confidence).sum::<f64>() / count;

    let current = forecast.current_price;
    let strength = if current > 0.0 {
        (average - current).abs() / current * 100.0
    } else {
        0.0
    };

    Ok(Summary {
        average_prediction: round2(average),
        max_prediction: round2(max),
        min_prediction: round2(min),
        trend: Trend::from_prices(average, current),
        trend_strength: round2(strength),
        confidence: round2(confidence * 100.0),
    })
}
