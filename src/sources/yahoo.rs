//! Yahoo Finance chart API client.
//!
//! Uses the unofficial v8 chart endpoint, which needs no key.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::SeriesProvider;
use crate::error::SourceError;
use crate::types::{normalize_series, RawBar};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Yahoo uses hyphens instead of dots for share classes (BRK-B, not BRK.B).
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

/// Yahoo Finance client.
pub struct YahooFinanceClient {
    client: Client,
    interval: String,
}

impl YahooFinanceClient {
    pub fn new(interval: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client, interval })
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }
}

#[async_trait]
impl SeriesProvider for YahooFinanceClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, SourceError> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(lookback_days) * 86_400;
        let url = format!(
            "{}/{}?period1={}&period2={}&interval={}&includePrePost=false",
            YAHOO_CHART_URL,
            normalize_yahoo_symbol(symbol),
            period1,
            period2,
            self.interval
        );

        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let data: YahooChartResponse = response.json().await?;
        parse_chart(data)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

fn parse_chart(data: YahooChartResponse) -> Result<Vec<RawBar>, SourceError> {
    if let Some(error) = data.chart.error {
        return Err(SourceError::Provider(format!(
            "{} - {}",
            error.code, error.description
        )));
    }

    let result = data
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(SourceError::Empty)?;

    let timestamps = result.timestamp.ok_or(SourceError::Empty)?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or(SourceError::Empty)?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let value = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    let bars: Vec<RawBar> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &timestamp)| {
            Some(RawBar {
                timestamp: timestamp * 1000,
                open: value(&opens, i)?,
                high: value(&highs, i)?,
                low: value(&lows, i)?,
                close: value(&closes, i)?,
                volume: value(&volumes, i).unwrap_or(0.0),
            })
        })
        .collect();

    let bars = normalize_series(bars);
    if bars.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(bars)
}
