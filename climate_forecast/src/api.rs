//! Request-layer shapes
//!
//! The interface the HTTP routing layer consumes: parallel date/value
//! payloads, the forecast request with its month/year horizon units, and
//! the not-ready/validation handling. Marshalling to a wire format stays
//! with the routing layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ClimateError, Result};
use crate::forecast;
use crate::lifecycle::LifecycleManager;

/// Unit of the requested forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonUnit {
    Month,
    Year,
}

/// A forecast request as received from the routing layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRequest {
    /// Number of horizon units to forecast
    #[serde(alias = "value")]
    pub horizon: i64,
    /// Whether the horizon counts months or years
    #[serde(alias = "type")]
    pub unit: HorizonUnit,
}

impl ForecastRequest {
    /// The horizon translated to whole months.
    ///
    /// Non-positive horizons are request-validation errors; they never
    /// reach the forecaster.
    pub fn horizon_months(&self) -> Result<usize> {
        if self.horizon < 1 {
            return Err(ClimateError::Validation(format!(
                "forecast horizon must be at least 1, got {}",
                self.horizon
            )));
        }
        let months = match self.unit {
            HorizonUnit::Month => self.horizon,
            HorizonUnit::Year => self.horizon.checked_mul(12).ok_or_else(|| {
                ClimateError::Validation(format!("forecast horizon {} years overflows", self.horizon))
            })?,
        };
        Ok(months as usize)
    }
}

/// Parallel ISO dates and values, the shape both endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPayload {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

/// Fetch the published snapshot, or trigger lazy initialization and
/// report not-ready.
fn ready_snapshot(manager: &LifecycleManager) -> Result<Arc<crate::snapshot::ModelSnapshot>> {
    match manager.current_snapshot() {
        Some(snapshot) => Ok(snapshot),
        None => {
            // Idempotent: a second request while the worker is already
            // running does not spawn another one.
            manager.ensure_worker();
            Err(ClimateError::NotReady)
        }
    }
}

/// The observed training history as a date/value payload.
pub fn get_history(manager: &LifecycleManager) -> Result<SeriesPayload> {
    let snapshot = ready_snapshot(manager)?;
    let train = &snapshot.split.train;
    Ok(SeriesPayload {
        dates: train
            .dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        values: train.values.clone(),
    })
}

/// A forecast for the requested horizon as a date/value payload.
///
/// The first entry is the anchor point (last training month) so charts
/// connect continuously to history.
pub fn get_forecast(
    manager: &LifecycleManager,
    request: &ForecastRequest,
) -> Result<SeriesPayload> {
    let months = request.horizon_months()?;
    let snapshot = ready_snapshot(manager)?;
    let series = forecast::forecast(&snapshot, months)?;
    Ok(SeriesPayload {
        dates: series.dates_iso(),
        values: series.values(),
    })
}
