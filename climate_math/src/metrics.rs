//! Accuracy metrics for evaluating forecasts against held-out actuals

use crate::{MathError, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(
            "actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute error between actual and predicted values.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean squared error between actual and predicted values.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error between actual and predicted values.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// Mean absolute percentage error, as a fraction of the actuals.
///
/// Zero actuals are skipped so the ratio stays finite; the divisor is the
/// full sample count.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Forecast accuracy summary
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (fraction)
    pub mape: f64,
}

/// Calculate the full accuracy summary for a forecast vs actual values.
pub fn forecast_accuracy(actual: &[f64], predicted: &[f64]) -> Result<ForecastAccuracy> {
    let mae = mean_absolute_error(actual, predicted)?;
    let mse = mean_squared_error(actual, predicted)?;
    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape: mean_absolute_percentage_error(actual, predicted)?,
    })
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}", self.mape)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        let mae = mean_absolute_error(&actual, &predicted).unwrap();
        assert!((mae - 2.4).abs() < 0.01);

        let mse = mean_squared_error(&actual, &predicted).unwrap();
        assert!((mse - 6.0).abs() < 0.01);

        let rmse = root_mean_squared_error(&actual, &predicted).unwrap();
        assert!((rmse - mse.sqrt()).abs() < 1e-12);

        let mape = mean_absolute_percentage_error(&actual, &predicted).unwrap();
        assert!(mape > 0.0 && mape < 0.15);
    }

    #[test]
    fn test_accuracy_summary() {
        let actual = vec![1.0, 2.0, 3.0];
        let predicted = vec![1.0, 2.0, 3.0];

        let accuracy = forecast_accuracy(&actual, &predicted).unwrap();
        assert_eq!(accuracy.mae, 0.0);
        assert_eq!(accuracy.rmse, 0.0);
        assert_eq!(accuracy.mape, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let empty: Vec<f64> = vec![];
        assert!(mean_absolute_error(&empty, &empty).is_err());
        assert!(mean_squared_error(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let actual = vec![0.0, 10.0];
        let predicted = vec![5.0, 11.0];

        let mape = mean_absolute_percentage_error(&actual, &predicted).unwrap();
        assert!((mape - 0.05).abs() < 1e-10);
    }
}
