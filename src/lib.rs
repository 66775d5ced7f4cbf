//! # Climate Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members: the forecasting
//! service library and its numeric building blocks.

pub use climate_forecast;
pub use climate_math;
