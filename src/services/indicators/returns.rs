//! Trailing returns and realized volatility.

/// Percent change over `periods` bars: `close[t] / close[t - periods] - 1`.
pub struct PriceChange {
    periods: usize,
}

impl Default for PriceChange {
    fn default() -> Self {
        Self { periods: 1 }
    }
}

impl PriceChange {
    pub fn new(periods: usize) -> Self {
        Self { periods: periods.max(1) }
    }

    pub fn min_periods(&self) -> usize {
        self.periods + 1
    }

    pub fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        (0..closes.len())
            .map(|i| {
                let past = closes.get(i.checked_sub(self.periods)?)?;
                let change = closes[i] / past - 1.0;
                change.is_finite().then_some(change)
            })
            .collect()
    }
}

/// Rolling sample standard deviation of 1-period returns.
pub struct Volatility {
    window: usize,
}

impl Default for Volatility {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl Volatility {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(2) }
    }

    /// One bar is consumed by the first return.
    pub fn min_periods(&self) -> usize {
        self.window + 1
    }

    pub fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let returns = PriceChange::new(1).calculate(closes);

        (0..returns.len())
            .map(|i| {
                let start = (i + 1).checked_sub(self.window)?;
                let window: Vec<f64> = returns[start..=i].iter().copied().collect::<Option<_>>()?;
                let mean = window.iter().sum::<f64>() / window.len() as f64;
                Some(super::std_dev(&window, mean, 1))
            })
            .collect()
    }
}
