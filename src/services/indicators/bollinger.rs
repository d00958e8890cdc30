//! Bollinger Bands indicator.

/// Upper, middle and lower bands aligned with the input.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population deviation of the window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period: period.max(1),
            std_dev_multiplier,
        }
    }

    pub fn min_periods(&self) -> usize {
        self.period
    }

    pub fn calculate(&self, closes: &[f64]) -> BollingerSeries {
        let len = closes.len();
        let mut series = BollingerSeries {
            upper: vec![None; len],
            middle: vec![None; len],
            lower: vec![None; len],
        };

        for end in self.period..=len {
            let window = &closes[end - self.period..end];
            let middle = window.iter().sum::<f64>() / self.period as f64;
            let std_dev = super::std_dev(window, middle, 0);

            let i = end - 1;
            series.middle[i] = Some(middle);
            series.upper[i] = Some(middle + self.std_dev_multiplier * std_dev);
            series.lower[i] = Some(middle - self.std_dev_multiplier * std_dev);
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_collapse_on_flat_series() {
        let series = BollingerBands::default().calculate(&[100.0; 25]);
        assert!(series.middle[18].is_none());
        assert_eq!(series.middle[19], Some(100.0));
        assert_eq!(series.upper[24], Some(100.0));
        assert_eq!(series.lower[24], Some(100.0));
    }

    #[test]
    fn test_bands_are_symmetric() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 4) as f64).collect();
        let series = BollingerBands::default().calculate(&closes);

        let upper = series.upper[29].unwrap();
        let middle = series.middle[29].unwrap();
        let lower = series.lower[29].unwrap();
        assert!(upper > middle && middle > lower);
        assert!(((upper - middle) - (middle - lower)).abs() < 1e-9);
    }

    #[test]
    fn test_population_std_dev() {
        // Window [1, 3] has population deviation 1.
        let series = BollingerBands::new(2, 2.0).calculate(&[1.0, 3.0]);
        assert_eq!(series.middle[1], Some(2.0));
        assert_eq!(series.upper[1], Some(4.0));
        assert_eq!(series.lower[1], Some(0.0));
    }
}
