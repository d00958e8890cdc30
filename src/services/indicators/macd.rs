//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::Ema;

/// MACD line and signal line, aligned with the input.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

impl MacdSeries {
    /// Line minus signal at `index`, when both are defined.
    pub fn histogram(&self, index: usize) -> Option<f64> {
        Some(self.line.get(index).copied()?? - self.signal.get(index).copied()??)
    }
}

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period: slow_period.max(fast_period),
            signal_period,
        }
    }

    /// Bars needed before the signal line is defined.
    pub fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    pub fn calculate(&self, closes: &[f64]) -> MacdSeries {
        let fast = Ema::new(self.fast_period).calculate(closes);
        let slow = Ema::new(self.slow_period).calculate(closes);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();

        let signal = Ema::new(self.signal_period).calculate_sparse(&line);

        MacdSeries { line, signal }
    }
}
