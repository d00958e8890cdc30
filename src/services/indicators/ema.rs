//! Exponential Moving Average (EMA) indicator.

/// Exponential Moving Average.
///
/// Uses multiplier `2 / (period + 1)` and seeds with the SMA of the first
/// `period` values, so the first output lands on index `period - 1`.
pub struct Ema {
    period: usize,
}

impl Default for Ema {
    fn default() -> Self {
        Self { period: 12 }
    }
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn min_periods(&self) -> usize {
        self.period
    }

    fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// EMA series aligned with `values`.
    pub fn calculate(&self, values: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; values.len()];
        if values.len() < self.period {
            return result;
        }

        let multiplier = self.multiplier();

        // First EMA is SMA
        let mut ema = values[..self.period].iter().sum::<f64>() / self.period as f64;
        result[self.period - 1] = Some(ema);

        for (i, value) in values.iter().enumerate().skip(self.period) {
            ema = (value - ema) * multiplier + ema;
            result[i] = Some(ema);
        }

        result
    }

    /// EMA over a series that is undefined up to some index and defined after it.
    pub fn calculate_sparse(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let start = match values.iter().position(Option::is_some) {
            Some(start) => start,
            None => return vec![None; values.len()],
        };

        let defined: Vec<f64> = values[start..].iter().map(|v| v.unwrap_or(f64::NAN)).collect();

        let mut result = vec![None; start];
        result.extend(
            self.calculate(&defined)
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite())),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_with_sma() {
        let ema = Ema::new(3);
        let result = ema.calculate(&[2.0, 4.0, 6.0, 8.0]);

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert!((result[2].unwrap() - 4.0).abs() < 1e-9);
        // (8 - 4) * 0.5 + 4
        assert!((result[3].unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_constant_series() {
        let ema = Ema::new(26);
        let result = ema.calculate(&[50.0; 60]);
        assert!(result[24].is_none());
        assert!((result[25].unwrap() - 50.0).abs() < 1e-9);
        assert!((result[59].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_tracks_uptrend_below_price() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let result = Ema::new(12).calculate(&values);
        let last = result[39].unwrap();
        assert!(last < values[39]);
        assert!(last > values[39] - 12.0);
    }

    #[test]
    fn test_ema_sparse_offsets_output() {
        let mut values = vec![None; 5];
        values.extend([1.0, 2.0, 3.0, 4.0].iter().map(|v| Some(*v)));

        let result = Ema::new(2).calculate_sparse(&values);
        assert_eq!(result.len(), 9);
        assert!(result[..6].iter().all(Option::is_none));
        assert!((result[6].unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_ema_sparse_all_undefined() {
        let result = Ema::new(3).calculate_sparse(&[None, None]);
        assert_eq!(result, vec![None, None]);
    }
}
