//! Per-feature standardization.

use crate::error::FitError;
use crate::types::FEATURE_COUNT;

/// Zero-mean, unit-variance scaling fitted on one set of rows and applied to others.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fit column means and population deviations. A constant column gets scale 1.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self, FitError> {
        if rows.is_empty() {
            return Err(FitError::EmptyInput);
        }
        check_finite(rows)?;

        let n = rows.len() as f64;
        let mut means = [0.0; FEATURE_COUNT];
        let mut scales = [1.0; FEATURE_COUNT];

        for column in 0..FEATURE_COUNT {
            let mean = rows.iter().map(|r| r[column]).sum::<f64>() / n;
            let variance = rows.iter().map(|r| (r[column] - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            means[column] = mean;
            if std > f64::EPSILON * mean.abs().max(1.0) {
                scales[column] = std;
            }
        }

        Ok(Self { means, scales })
    }

    pub fn transform(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (column, value) in row.iter().enumerate() {
            scaled[column] = (value - self.means[column]) / self.scales[column];
        }
        scaled
    }

    pub fn transform_all(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn means(&self) -> &[f64; FEATURE_COUNT] {
        &self.means
    }

    pub fn scales(&self) -> &[f64; FEATURE_COUNT] {
        &self.scales
    }
}

/// Reject NaN or infinite inputs before fitting.
pub(crate) fn check_finite(rows: &[[f64; FEATURE_COUNT]]) -> Result<(), FitError> {
    for (row, values) in rows.iter().enumerate() {
        if let Some(column) = values.iter().position(|v| !v.is_finite()) {
            return Err(FitError::NonFinite { row, column });
        }
    }
    Ok(())
}
