//! Observation data acquisition
//!
//! Fetches raw records from the open-data datastore, merges the configured
//! resources on their shared month key, coerces every cell to a number and
//! produces the time-indexed [`RawObservationTable`] the series preparer
//! consumes. Coercion failure is fatal for the whole load.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use polars::prelude::*;
use serde::Deserialize;

use crate::config::ForecastConfig;
use crate::error::{ClimateError, Result};

/// One raw upstream record, keyed by field name
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// Source of raw records for a single datastore resource.
///
/// This is the transport seam: production uses [`DatastoreClient`], tests
/// substitute a stub.
pub trait RecordSource: Send + Sync {
    /// Fetch every record of the given resource.
    fn records(&self, resource_id: &str) -> Result<Vec<JsonRecord>>;
}

#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    result: DatastoreResult,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    records: Vec<JsonRecord>,
    total: Option<u64>,
}

/// HTTP client for the datastore search API
#[derive(Debug)]
pub struct DatastoreClient {
    endpoint: String,
    page_limit: usize,
    client: reqwest::blocking::Client,
}

impl DatastoreClient {
    /// Create a client for the configured endpoint and page size.
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            endpoint: config.api_endpoint.clone(),
            page_limit: config.page_limit,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl RecordSource for DatastoreClient {
    fn records(&self, resource_id: &str) -> Result<Vec<JsonRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let limit = self.page_limit.to_string();
            let page_offset = offset.to_string();
            let response: DatastoreResponse = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("resource_id", resource_id),
                    ("limit", limit.as_str()),
                    ("offset", page_offset.as_str()),
                ])
                .send()?
                .error_for_status()?
                .json()?;

            let page = response.result.records;
            let page_len = page.len();
            records.extend(page);
            debug!(
                "fetched {} records of resource {} (offset {})",
                page_len, resource_id, offset
            );

            let total = response.result.total.unwrap_or(records.len() as u64);
            if page_len < self.page_limit || records.len() as u64 >= total {
                break;
            }
            offset += page_len;
        }

        if records.is_empty() {
            return Err(ClimateError::DataAcquisition(format!(
                "resource {} returned no records",
                resource_id
            )));
        }

        Ok(records)
    }
}

/// Merged, month-indexed, numeric observation table.
///
/// Immutable after construction; one is built per retrain cycle.
#[derive(Debug, Clone)]
pub struct RawObservationTable {
    df: DataFrame,
    months: Vec<NaiveDate>,
    value_columns: Vec<String>,
}

impl RawObservationTable {
    /// Number of monthly rows.
    pub fn height(&self) -> usize {
        self.months.len()
    }

    /// The month axis, strictly increasing, first-of-month dates.
    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    /// Names of the numeric value columns.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// The backing DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Extract a value column as `f64`, matching on the stored dtype.
    pub fn column_as_f64(&self, column_name: &str) -> Result<Vec<f64>> {
        let col = self.df.column(column_name).map_err(|e| {
            ClimateError::Data(format!("Column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64()?.into_iter().flatten().collect()),
            DataType::Int64 => Ok(col.i64()?.into_iter().flatten().map(|v| v as f64).collect()),
            _ => Err(ClimateError::Data(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }
}

/// Parse the shared month key, accepting `YYYY-MM` or a full calendar date.
fn parse_month(raw: &str) -> Result<NaiveDate> {
    let padded;
    let candidate = if raw.len() == 7 {
        padded = format!("{}-01", raw);
        &padded
    } else {
        raw
    };
    let date = NaiveDate::parse_from_str(candidate, "%Y-%m-%d").map_err(|e| {
        ClimateError::DataAcquisition(format!("unparseable month key '{}': {}", raw, e))
    })?;
    // Normalize to the first of the month so the axis steps by whole months.
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).ok_or_else(|| {
        ClimateError::DataAcquisition(format!("month key '{}' out of range", raw))
    })
}

/// Coerce one upstream cell to `f64`; any failure is fatal for the load.
fn coerce_numeric(field: &str, value: &serde_json::Value) -> Result<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
            ClimateError::DataAcquisition(format!("field '{}' is not representable as f64", field))
        }),
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            ClimateError::DataAcquisition(format!(
                "field '{}' value '{}' is not numeric",
                field, s
            ))
        }),
        other => Err(ClimateError::DataAcquisition(format!(
            "field '{}' has non-numeric value {}",
            field, other
        ))),
    }
}

type MonthRows = BTreeMap<NaiveDate, Vec<(String, f64)>>;

/// Parse one resource's records into month-keyed numeric rows.
fn resource_rows(records: &[JsonRecord]) -> Result<MonthRows> {
    let mut rows = MonthRows::new();
    for record in records {
        let month_value = record.get("month").ok_or_else(|| {
            ClimateError::DataAcquisition("record is missing its 'month' key".to_string())
        })?;
        let month_str = month_value.as_str().ok_or_else(|| {
            ClimateError::DataAcquisition("record 'month' key is not a string".to_string())
        })?;
        let month = parse_month(month_str)?;

        let mut values = Vec::with_capacity(record.len());
        for (field, value) in record {
            if field == "month" || field == "_id" {
                continue;
            }
            values.push((field.clone(), coerce_numeric(field, value)?));
        }
        // Later duplicates of a month replace earlier ones.
        rows.insert(month, values);
    }
    Ok(rows)
}

/// Fetch and merge every configured resource into one observation table.
///
/// Resources are inner-merged on the month key, renamed per configuration,
/// truncated to `max_rows` (oldest first) and materialized as a DataFrame
/// with one `f64` column per variable.
pub fn acquire(source: &dyn RecordSource, config: &ForecastConfig) -> Result<RawObservationTable> {
    if config.resource_ids.is_empty() {
        return Err(ClimateError::DataAcquisition(
            "no resource ids configured".to_string(),
        ));
    }

    info!("acquiring {} upstream resource(s)", config.resource_ids.len());

    let mut merged: Option<MonthRows> = None;
    for resource_id in &config.resource_ids {
        let rows = resource_rows(&source.records(resource_id)?)?;
        merged = Some(match merged.take() {
            None => rows,
            Some(mut acc) => {
                // Inner merge: keep months present in every resource.
                acc.retain(|month, _| rows.contains_key(month));
                for (month, values) in rows {
                    if let Some(row) = acc.get_mut(&month) {
                        row.extend(values);
                    }
                }
                acc
            }
        });
    }

    let merged = merged.unwrap_or_default();
    if merged.is_empty() {
        return Err(ClimateError::DataAcquisition(
            "merged observation table is empty".to_string(),
        ));
    }

    // Column order from the first row; every row must agree.
    let first_row = merged.values().next().ok_or_else(|| {
        ClimateError::DataAcquisition("merged observation table is empty".to_string())
    })?;
    let rename = |name: &str| -> String {
        config
            .column_renames
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.clone())
            .unwrap_or_else(|| name.to_string())
    };
    let column_names: Vec<String> = first_row.iter().map(|(name, _)| rename(name)).collect();

    let mut months = Vec::with_capacity(merged.len().min(config.max_rows));
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); column_names.len()];
    for (month, row) in merged.into_iter().take(config.max_rows) {
        if row.len() != column_names.len() {
            return Err(ClimateError::DataAcquisition(format!(
                "row for {} has {} columns, expected {}",
                month,
                row.len(),
                column_names.len()
            )));
        }
        months.push(month);
        for (slot, (_, value)) in columns.iter_mut().zip(row.iter()) {
            slot.push(*value);
        }
    }

    let month_ms: Vec<i64> = months
        .iter()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis())
        .collect();
    let mut series = vec![Series::new("month", month_ms)];
    for (name, values) in column_names.iter().zip(columns.into_iter()) {
        series.push(Series::new(name, values));
    }
    let df = DataFrame::new(series)?;

    info!(
        "observation table ready: {} months x {} variable(s)",
        months.len(),
        column_names.len()
    );

    Ok(RawObservationTable {
        df,
        months,
        value_columns: column_names,
    })
}
