//! Recursive multi-step forecasting
//!
//! Drives the trained network autoregressively: every prediction beyond
//! the first is conditioned on prior predictions rather than ground truth,
//! which is what compounds error over long horizons. Output values are
//! denormalized in one batch and anchored to the last training point so
//! charts connect continuously to history.

use chrono::{Months, NaiveDate};
use climate_math::metrics::{forecast_accuracy, ForecastAccuracy};
use log::{info, warn};

use crate::error::{ClimateError, Result};
use crate::model::SequenceModel;
use crate::series::{TrainTestSplit, EVAL_MONTHS};
use crate::snapshot::ModelSnapshot;

/// One forecasted (or anchor) point.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// An anchor point followed by one point per forecasted step, dates
/// advancing by exactly one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Number of points, anchor included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dates rendered as ISO calendar-date strings.
    pub fn dates_iso(&self) -> Vec<String> {
        self.points
            .iter()
            .map(|p| p.date.format("%Y-%m-%d").to_string())
            .collect()
    }

    /// The point values, parallel to the dates.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Roll a model forward `steps` times from a seed window.
///
/// The window slides by dropping its oldest element and appending each
/// new prediction. Returns the normalized predictions in order.
pub fn roll_forward(
    model: &dyn SequenceModel,
    seed_window: &[f64],
    steps: usize,
) -> Result<Vec<f64>> {
    let mut window = seed_window.to_vec();
    let mut predictions = Vec::with_capacity(steps);

    for _ in 0..steps {
        let next = model.predict_one(&window)?;
        predictions.push(next);
        window.remove(0);
        window.push(next);
    }

    Ok(predictions)
}

/// Accuracy of a denormalized prediction run against the held-out
/// evaluation segment. `None` when no complete evaluation segment exists
/// or the lengths differ.
pub fn holdout_accuracy(split: &TrainTestSplit, predictions: &[f64]) -> Option<ForecastAccuracy> {
    if split.eval.is_empty() || split.eval.len() != predictions.len() {
        return None;
    }
    match forecast_accuracy(&split.eval.values, predictions) {
        Ok(accuracy) => Some(accuracy),
        Err(e) => {
            warn!("holdout accuracy not computable: {}", e);
            None
        }
    }
}

/// Produce an `num_steps`-month-ahead forecast from a published snapshot.
///
/// `num_steps == 0` is valid and yields the anchor point alone. When the
/// horizon is exactly one evaluation year, residual diagnostics against
/// the held-out actuals are logged.
pub fn forecast(snapshot: &ModelSnapshot, num_steps: usize) -> Result<ForecastSeries> {
    let window_len = snapshot.network.window_len();
    let train = &snapshot.split.train;
    if snapshot.train_norm.len() < window_len {
        return Err(ClimateError::Forecast(format!(
            "training segment has {} value(s); {} needed to seed the window",
            snapshot.train_norm.len(),
            window_len
        )));
    }

    let seed = &snapshot.train_norm[snapshot.train_norm.len() - window_len..];
    let normalized = roll_forward(&snapshot.network, seed, num_steps)?;
    let predictions = snapshot.scaler.inverse_all(&normalized);

    if num_steps == EVAL_MONTHS {
        if let Some(accuracy) = holdout_accuracy(&snapshot.split, &predictions) {
            info!(
                "holdout evaluation: mean absolute percentage error {:.4}, root mean squared error {:.4}",
                accuracy.mape, accuracy.rmse
            );
        }
    }

    let anchor_date = *train.dates.last().ok_or_else(|| {
        ClimateError::Forecast("training segment has no dates".to_string())
    })?;
    let anchor_value = *train.values.last().ok_or_else(|| {
        ClimateError::Forecast("training segment has no values".to_string())
    })?;

    let mut points = Vec::with_capacity(num_steps + 1);
    points.push(ForecastPoint {
        date: anchor_date,
        value: anchor_value,
    });
    for (step, &value) in predictions.iter().enumerate() {
        let date = anchor_date
            .checked_add_months(Months::new(step as u32 + 1))
            .ok_or_else(|| {
                ClimateError::Forecast(format!("forecast date overflow at step {}", step + 1))
            })?;
        points.push(ForecastPoint { date, value });
    }

    Ok(ForecastSeries { points })
}
