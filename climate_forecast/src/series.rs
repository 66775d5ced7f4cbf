//! Series preparation
//!
//! Derives the monthly-mean target series from the raw observation table,
//! splits it at the fixed configuration cutoffs and fits the min-max
//! scaler on the training segment only.

use chrono::{Months, NaiveDate};
use climate_math::scaling::MinMaxScaler;
use log::{info, warn};

use crate::config::ForecastConfig;
use crate::data::RawObservationTable;
use crate::error::{ClimateError, Result};

/// Number of months in a complete evaluation segment.
pub const EVAL_MONTHS: usize = 12;

/// A single named numeric variable indexed by month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Create a series from parallel months and values.
    pub fn new(name: &str, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ClimateError::Data(format!(
                "series '{}' has {} date(s) but {} value(s)",
                name,
                dates.len(),
                values.len()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            dates,
            values,
        })
    }

    /// Name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The month axis.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The observed values, parallel to the month axis.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of months in the series.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series holds no months.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// A contiguous run of months with their observed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSegment {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl SeriesSegment {
    /// Number of months in the segment.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the segment holds no months.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Partition of a [`MonthlySeries`] into training and evaluation segments.
///
/// The segments are disjoint and together form a prefix of the series up
/// to the evaluation cutoff; the evaluation segment is either empty or
/// exactly [`EVAL_MONTHS`] long.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: SeriesSegment,
    pub eval: SeriesSegment,
}

/// Everything the trainer needs from one raw table.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub series: MonthlySeries,
    pub split: TrainTestSplit,
    pub scaler: MinMaxScaler,
    pub train_norm: Vec<f64>,
    pub eval_norm: Vec<f64>,
}

/// Resample one table column to monthly means.
///
/// The table's month axis is already monthly, so this is a grouped mean
/// over identical months followed by the gap-free index check.
pub fn monthly_mean(table: &RawObservationTable, column: &str) -> Result<MonthlySeries> {
    let raw_values = table.column_as_f64(column)?;
    let months = table.months();
    if months.len() != raw_values.len() {
        return Err(ClimateError::Data(format!(
            "column '{}' length {} does not match the month axis length {}",
            column,
            raw_values.len(),
            months.len()
        )));
    }

    let mut dates: Vec<NaiveDate> = Vec::with_capacity(months.len());
    let mut sums: Vec<f64> = Vec::with_capacity(months.len());
    let mut counts: Vec<usize> = Vec::with_capacity(months.len());
    for (&month, &value) in months.iter().zip(raw_values.iter()) {
        match dates.last() {
            Some(&last) if last == month => {
                let idx = sums.len() - 1;
                sums[idx] += value;
                counts[idx] += 1;
            }
            Some(&last) if month < last => {
                return Err(ClimateError::Data(format!(
                    "month axis is not sorted at {}",
                    month
                )));
            }
            _ => {
                dates.push(month);
                sums.push(value);
                counts.push(1);
            }
        }
    }

    let values: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, c)| s / *c as f64)
        .collect();

    // The monthly index must be gap-free over the observed range.
    for pair in dates.windows(2) {
        if pair[0] + Months::new(1) != pair[1] {
            return Err(ClimateError::Data(format!(
                "monthly series '{}' has a gap between {} and {}",
                column, pair[0], pair[1]
            )));
        }
    }

    Ok(MonthlySeries {
        name: column.to_string(),
        dates,
        values,
    })
}

/// Split a monthly series at the fixed cutoffs.
///
/// Training takes every month strictly before `train_cutoff`; evaluation
/// takes the months in `[train_cutoff, eval_cutoff)`. An incomplete
/// evaluation segment is dropped rather than published.
pub fn split_series(
    series: &MonthlySeries,
    train_cutoff: NaiveDate,
    eval_cutoff: NaiveDate,
) -> Result<TrainTestSplit> {
    let mut train = SeriesSegment::default();
    let mut eval = SeriesSegment::default();

    for (&date, &value) in series.dates().iter().zip(series.values().iter()) {
        if date < train_cutoff {
            train.dates.push(date);
            train.values.push(value);
        } else if date < eval_cutoff {
            eval.dates.push(date);
            eval.values.push(value);
        }
    }

    if train.is_empty() {
        return Err(ClimateError::Data(format!(
            "no training months before cutoff {}",
            train_cutoff
        )));
    }

    if !eval.is_empty() && eval.len() != EVAL_MONTHS {
        warn!(
            "evaluation segment has {} month(s), expected {}; dropping it",
            eval.len(),
            EVAL_MONTHS
        );
        eval = SeriesSegment::default();
    }

    Ok(TrainTestSplit { train, eval })
}

/// Prepare a raw observation table for training.
pub fn prepare(table: &RawObservationTable, config: &ForecastConfig) -> Result<PreparedSeries> {
    let window_len = config.model.window_len;
    if table.height() < window_len + 1 {
        return Err(ClimateError::Data(format!(
            "observation table has {} row(s); at least {} needed for window length {}",
            table.height(),
            window_len + 1,
            window_len
        )));
    }

    let series = monthly_mean(table, &config.target_column)?;
    let split = split_series(&series, config.train_cutoff, config.eval_cutoff)?;

    if split.train.len() < window_len + 1 {
        return Err(ClimateError::Data(format!(
            "training segment has {} month(s); at least {} needed for window length {}",
            split.train.len(),
            window_len + 1,
            window_len
        )));
    }

    // The scaler sees the training segment only; evaluation data never
    // influences normalization.
    let scaler = MinMaxScaler::fit(&split.train.values)?;
    let train_norm = scaler.transform_all(&split.train.values);
    let eval_norm = scaler.transform_all(&split.eval.values);

    info!(
        "prepared series '{}': {} training month(s), {} evaluation month(s)",
        series.name(),
        split.train.len(),
        split.eval.len()
    );

    Ok(PreparedSeries {
        series,
        split,
        scaler,
        train_norm,
        eval_norm,
    })
}
