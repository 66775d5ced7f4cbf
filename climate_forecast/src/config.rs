//! Configuration for the forecasting service
//!
//! Every fixed constant of the system lives here: upstream resources,
//! split cutoffs, network architecture and training hyperparameters, and
//! the retrain cadence. Behavior is deterministic across runs given the
//! same configuration and raw data.

use chrono::{NaiveDate, Weekday};
use serde::Deserialize;

/// Resource id of the monthly mean surface air temperature series on the
/// Singapore open-data datastore.
pub const SURFACE_AIR_TEMP_MONTHLY_MEAN: &str = "07654ce7-f97f-49c9-81c6-bd41beba4e96";

/// Architecture and training hyperparameters of the recurrent model
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Input window length in months
    pub window_len: usize,
    /// Hidden width of the recurrent layer
    pub hidden: usize,
    /// Dropout rate applied to the final hidden state during training
    pub dropout: f64,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Fixed epoch count per training run
    pub epochs: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_len: 12,
            hidden: 100,
            dropout: 0.5,
            learning_rate: 0.001,
            epochs: 300,
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    /// Base URL of the datastore search endpoint
    pub api_endpoint: String,
    /// Resource ids to fetch and merge on the shared month key
    pub resource_ids: Vec<String>,
    /// Upstream column renames, applied after the merge
    pub column_renames: Vec<(String, String)>,
    /// Name of the target column after renames
    pub target_column: String,
    /// Page size for the paginated fetch
    pub page_limit: usize,
    /// Maximum number of merged rows kept, oldest first
    pub max_rows: usize,
    /// First month excluded from the training segment
    pub train_cutoff: NaiveDate,
    /// First month excluded from the evaluation segment
    pub eval_cutoff: NaiveDate,
    /// Key under which the published snapshot is stored
    pub cache_key: String,
    /// Weekday on which the recurring retrain fires
    pub retrain_weekday: Weekday,
    /// Seconds between schedule polls in the worker loop
    pub poll_interval_secs: u64,
    /// Seed for all pseudo-random sources
    pub seed: u64,
    /// Model architecture and training settings
    pub model: ModelConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://data.gov.sg/api/action/datastore_search".to_string(),
            resource_ids: vec![SURFACE_AIR_TEMP_MONTHLY_MEAN.to_string()],
            column_renames: vec![
                ("max_temperature".to_string(), "max_temp".to_string()),
                ("temp_extremes_min".to_string(), "min_temp".to_string()),
                (
                    "maximum_rainfall_in_a_day".to_string(),
                    "max_rainfall_daily".to_string(),
                ),
                ("no_of_rainy_days".to_string(), "num_rainy_days".to_string()),
                ("rh_extremes_minimum".to_string(), "min_rh".to_string()),
                (
                    "mean_sunshine_hrs".to_string(),
                    "mean_sunshine_hrs_daily".to_string(),
                ),
            ],
            target_column: "mean_temp".to_string(),
            page_limit: 1000,
            max_rows: 496,
            train_cutoff: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            eval_cutoff: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            cache_key: "climate_model".to_string(),
            retrain_weekday: Weekday::Sun,
            poll_interval_secs: 1,
            seed: 123,
            model: ModelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = ForecastConfig::default();
        assert_eq!(config.model.window_len, 12);
        assert_eq!(config.model.hidden, 100);
        assert_eq!(config.model.epochs, 300);
        assert_eq!(config.max_rows, 496);
        assert_eq!(
            config.eval_cutoff,
            config.train_cutoff + chrono::Months::new(12)
        );
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ForecastConfig =
            serde_json::from_str(r#"{"max_rows": 200, "target_column": "mean_temp"}"#).unwrap();
        assert_eq!(config.max_rows, 200);
        assert_eq!(config.model.epochs, 300);
    }
}
