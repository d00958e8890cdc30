use serde::{Deserialize, Serialize};

/// One sampling interval of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Interval start, milliseconds since the Unix epoch (UTC).
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawBar {
    /// Whether every price field is a usable positive number.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

/// Sort bars by timestamp and drop invalid or duplicate intervals.
pub fn normalize_series(mut bars: Vec<RawBar>) -> Vec<RawBar> {
    bars.retain(RawBar::is_valid);
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}
