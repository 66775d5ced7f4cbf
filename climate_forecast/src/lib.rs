//! # Climate Forecast
//!
//! A Rust library for forecasting a monthly climate time series (mean
//! surface air temperature) with a recurrent sequence model.
//!
//! ## Features
//!
//! - Acquisition of open-data climate records, merged on a shared month key
//! - Monthly-mean series preparation with a fixed train/evaluation split
//! - Sliding-window supervised pair generation
//! - Deterministically seeded LSTM training (Adam, mean squared error)
//! - Recursive multi-step forecasting with holdout diagnostics
//! - A background lifecycle that retrains weekly and publishes atomic
//!   model snapshots
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use climate_forecast::api::{self, ForecastRequest, HorizonUnit};
//! use climate_forecast::config::ForecastConfig;
//! use climate_forecast::data::DatastoreClient;
//! use climate_forecast::lifecycle::LifecycleManager;
//! use climate_forecast::snapshot::MemoryStore;
//!
//! let config = ForecastConfig::default();
//! let client = Arc::new(DatastoreClient::new(&config));
//! let store = Arc::new(MemoryStore::new());
//! let manager = LifecycleManager::new(config, client, store);
//! manager.ensure_worker();
//!
//! // Once the first training has published a snapshot:
//! let request = ForecastRequest { horizon: 6, unit: HorizonUnit::Month };
//! if let Ok(payload) = api::get_forecast(&manager, &request) {
//!     println!("{:?}", payload.values);
//! }
//! ```

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod lifecycle;
pub mod model;
pub mod schedule;
pub mod series;
pub mod snapshot;
pub mod window;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::error::{ClimateError, Result};
pub use crate::forecast::{ForecastPoint, ForecastSeries};
pub use crate::lifecycle::{LifecycleManager, LifecycleState};
pub use crate::model::{set_determinism, LstmNetwork, SequenceModel};
pub use crate::snapshot::{MemoryStore, ModelSnapshot, SnapshotStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
