//! Simple Moving Average (SMA) indicator.

/// Simple Moving Average.
///
/// Arithmetic mean of the trailing `period` values. Used over closes for the
/// 20/50 trend averages and over volume for the volume average.
pub struct Sma {
    period: usize,
}

impl Default for Sma {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of values needed before the first output.
    pub fn min_periods(&self) -> usize {
        self.period
    }

    /// Rolling mean, `None` until the window is full.
    pub fn calculate(&self, values: &[f64]) -> Vec<Option<f64>> {
        let mut result = Vec::with_capacity(values.len());
        let mut sum = 0.0;

        for (i, value) in values.iter().enumerate() {
            sum += value;
            if i >= self.period {
                sum -= values[i - self.period];
            }

            if i + 1 >= self.period {
                result.push(Some(sum / self.period as f64));
            } else {
                result.push(None);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_warmup() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 3);
    }

    #[test]
    fn test_sma_values() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert!((result[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((result[3].unwrap() - 3.0).abs() < 1e-9);
        assert!((result[4].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_sma_short_input() {
        let sma = Sma::new(20);
        let result = sma.calculate(&[1.0; 10]);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_sma_constant_series() {
        let sma = Sma::default();
        let result = sma.calculate(&[7.5; 40]);
        assert!((result[39].unwrap() - 7.5).abs() < 1e-9);
        assert_eq!(sma.min_periods(), 20);
    }
}
