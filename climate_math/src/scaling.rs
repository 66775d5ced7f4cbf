//! Min-max scaling for normalized model inputs

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Affine min-max scaler fit on a reference segment of a series.
///
/// Maps the fitted range onto `[0, 1]` and back. A degenerate range
/// (all fitted values equal) transforms every value to `0.0` and inverts
/// every value to the observed minimum, so a constant series survives a
/// normalize/denormalize round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler on a slice of observed values.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "cannot fit scaler on an empty slice".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "cannot fit scaler on non-finite values".to_string(),
            ));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self { min, max })
    }

    /// The observed minimum of the fitted segment.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// The observed maximum of the fitted segment.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// The fitted range (`max - min`).
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Normalize a single value into the fitted range.
    pub fn transform(&self, value: f64) -> f64 {
        let range = self.range();
        if range > 0.0 {
            (value - self.min) / range
        } else {
            0.0
        }
    }

    /// Invert a normalized value back to the original scale.
    pub fn inverse(&self, value: f64) -> f64 {
        value * self.range() + self.min
    }

    /// Normalize a whole slice.
    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    /// Invert a whole slice of normalized values.
    pub fn inverse_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_and_round_trip() {
        let values = vec![25.1, 26.4, 27.9, 26.0, 28.3];
        let scaler = MinMaxScaler::fit(&values).unwrap();

        assert_eq!(scaler.min(), 25.1);
        assert_eq!(scaler.max(), 28.3);

        for &v in &values {
            let n = scaler.transform(v);
            assert!((0.0..=1.0).contains(&n));
            assert!((scaler.inverse(n) - v).abs() < 1e-10);
        }
    }

    #[test]
    fn test_degenerate_range() {
        let values = vec![10.0; 24];
        let scaler = MinMaxScaler::fit(&values).unwrap();

        assert_eq!(scaler.range(), 0.0);
        assert_eq!(scaler.transform(10.0), 0.0);
        // Any normalized value inverts to the observed minimum.
        assert_eq!(scaler.inverse(0.0), 10.0);
        assert_eq!(scaler.inverse(0.73), 10.0);
    }

    #[test]
    fn test_fit_rejects_empty_and_non_finite() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_transform_all_inverse_all() {
        let values = vec![0.0, 5.0, 10.0];
        let scaler = MinMaxScaler::fit(&values).unwrap();

        let normalized = scaler.transform_all(&values);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);

        let restored = scaler.inverse_all(&normalized);
        for (r, v) in restored.iter().zip(values.iter()) {
            assert!((r - v).abs() < 1e-10);
        }
    }
}
