//! Relative Strength Index (RSI) indicator.

/// RSI (Relative Strength Index) indicator.
///
/// Wilder smoothing: the first average gain/loss is the simple mean of the first
/// `period` changes, then `avg = (avg * (period - 1) + change) / period`.
/// Values range from 0-100; a window with no losses reads 100.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }

    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }

    pub fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; closes.len()];
        if closes.len() < self.min_periods() {
            return result;
        }

        let mut gains = Vec::with_capacity(closes.len() - 1);
        let mut losses = Vec::with_capacity(closes.len() - 1);

        for window in closes.windows(2) {
            let change = window[1] - window[0];
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        let period = self.period as f64;
        let mut avg_gain = gains[..self.period].iter().sum::<f64>() / period;
        let mut avg_loss = losses[..self.period].iter().sum::<f64>() / period;
        result[self.period] = Some(Self::from_averages(avg_gain, avg_loss));

        for i in self.period..gains.len() {
            avg_gain = (avg_gain * (period - 1.0) + gains[i]) / period;
            avg_loss = (avg_loss * (period - 1.0) + losses[i]) / period;
            // change i sits between closes i and i + 1
            result[i + 1] = Some(Self::from_averages(avg_gain, avg_loss));
        }

        result
    }
}
