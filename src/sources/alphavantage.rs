//! Alpha Vantage API client for daily stock history.
//!
//! Note: the free tier is heavily rate limited (25 requests/day, 5/minute). Throttling
//! shows up as a 200 response carrying a "Note" or "Information" message.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::SeriesProvider;
use crate::error::SourceError;
use crate::types::{normalize_series, RawBar};

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Days covered by the "compact" output size.
const COMPACT_DAYS: u32 = 100;

#[derive(Debug, Deserialize)]
struct TimeSeriesDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, TimeSeriesDataPoint>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesDataPoint {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Alpha Vantage client.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl SeriesProvider for AlphaVantageClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, SourceError> {
        // "compact" is the last 100 trading days; anything longer needs "full".
        let output_size = if lookback_days <= COMPACT_DAYS {
            "compact"
        } else {
            "full"
        };
        let url = format!(
            "{}?function=TIME_SERIES_DAILY&symbol={}&outputsize={}&apikey={}",
            ALPHA_VANTAGE_URL,
            symbol.to_uppercase(),
            output_size,
            self.api_key
        );

        debug!(%symbol, output_size, "Fetching Alpha Vantage daily series");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let data: TimeSeriesDailyResponse = response.json().await?;
        let cutoff = Utc::now().timestamp_millis() - i64::from(lookback_days) * 86_400_000;
        parse_daily(data, cutoff)
    }

    fn name(&self) -> &'static str {
        "alphavantage"
    }
}

/// Convert a daily response into bars at or after `cutoff` (ms).
fn parse_daily(data: TimeSeriesDailyResponse, cutoff: i64) -> Result<Vec<RawBar>, SourceError> {
    if let Some(message) = data.error_message.or(data.note).or(data.information) {
        return Err(SourceError::Provider(message));
    }

    let series = data.time_series.ok_or(SourceError::Empty)?;

    let bars: Vec<RawBar> = series
        .into_iter()
        .filter_map(|(date, point)| {
            let bar = parse_point(&date, &point);
            if bar.is_none() {
                warn!(%date, "Skipping unparseable Alpha Vantage bar");
            }
            bar
        })
        .filter(|bar| bar.timestamp >= cutoff)
        .collect();

    let bars = normalize_series(bars);
    if bars.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(bars)
}

fn parse_point(date: &str, point: &TimeSeriesDataPoint) -> Option<RawBar> {
    let timestamp = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp_millis();

    Some(RawBar {
        timestamp,
        open: point.open.parse().ok()?,
        high: point.high.parse().ok()?,
        low: point.low.parse().ok()?,
        close: point.close.parse().ok()?,
        volume: point.volume.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-03-05": {"1. open": "185.0", "2. high": "187.2", "3. low": "184.1", "4. close": "186.5", "5. volume": "4100000"},
            "2024-03-04": {"1. open": "184.0", "2. high": "186.0", "3. low": "183.5", "4. close": "185.1", "5. volume": "3900000"},
            "2024-01-02": {"1. open": "160.0", "2. high": "162.0", "3. low": "159.0", "4. close": "161.0", "5. volume": "3000000"},
            "bad-date":   {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}
        }
    }"#;

    fn response(json: &str) -> TimeSeriesDailyResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_daily_sorted_and_trimmed() {
        // 2024-03-01T00:00:00Z
        let cutoff = 1_709_251_200_000;
        let bars = parse_daily(response(SAMPLE), cutoff).unwrap();

        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 185.1);
        assert_eq!(bars[1].volume, 4_100_000.0);
    }

    #[test]
    fn test_parse_daily_without_cutoff_keeps_all_valid_rows() {
        let bars = parse_daily(response(SAMPLE), 0).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].close, 161.0);
    }

    #[test]
    fn test_parse_daily_rate_limit_note() {
        let result = parse_daily(
            response(r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#),
            0,
        );
        assert!(matches!(result, Err(SourceError::Provider(m)) if m.contains("call frequency")));
    }

    #[test]
    fn test_parse_daily_error_message() {
        let result = parse_daily(
            response(r#"{"Error Message": "Invalid API call."}"#),
            0,
        );
        assert!(matches!(result, Err(SourceError::Provider(_))));
    }

    #[test]
    fn test_parse_daily_everything_trimmed_is_empty() {
        let result = parse_daily(response(SAMPLE), i64::MAX);
        assert!(matches!(result, Err(SourceError::Empty)));
    }
}
