//! End-to-end wiring demo: train on live open data, then print the
//! history and a one-year forecast.
//!
//! Run with `RUST_LOG=info cargo run --example run_forecast`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use climate_forecast::api::{self, ForecastRequest, HorizonUnit};
use climate_forecast::config::ForecastConfig;
use climate_forecast::data::DatastoreClient;
use climate_forecast::lifecycle::{LifecycleManager, LifecycleState};
use climate_forecast::snapshot::MemoryStore;

fn main() {
    env_logger::init();

    let config = ForecastConfig::default();
    let client = Arc::new(DatastoreClient::new(&config));
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(config, client, store);

    println!("Starting lifecycle worker (initial training)...");
    manager.ensure_worker();

    let mut seen_training = false;
    while manager.current_snapshot().is_none() {
        match manager.state() {
            LifecycleState::Training | LifecycleState::Retraining => seen_training = true,
            LifecycleState::Uninitialized if seen_training => {
                eprintln!("initial training failed; see logs");
                return;
            }
            _ => {}
        }
        thread::sleep(Duration::from_millis(500));
    }

    match api::get_history(&manager) {
        Ok(history) => {
            println!(
                "History: {} months, {} .. {}",
                history.values.len(),
                history.dates.first().map(String::as_str).unwrap_or("-"),
                history.dates.last().map(String::as_str).unwrap_or("-"),
            );
        }
        Err(e) => eprintln!("history unavailable: {}", e),
    }

    let request = ForecastRequest {
        horizon: 1,
        unit: HorizonUnit::Year,
    };
    match api::get_forecast(&manager, &request) {
        Ok(payload) => {
            println!("One-year forecast (anchor first):");
            for (date, value) in payload.dates.iter().zip(payload.values.iter()) {
                println!("  {}  {:.2}", date, value);
            }
        }
        Err(e) => eprintln!("forecast unavailable: {}", e),
    }
}
