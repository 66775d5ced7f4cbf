use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use chrono::{Months, NaiveDate};
use climate_forecast::config::{ForecastConfig, ModelConfig};
use climate_forecast::data::{JsonRecord, RecordSource};
use climate_forecast::error::{ClimateError, Result};
use climate_forecast::lifecycle::{LifecycleManager, LifecycleState};
use climate_forecast::snapshot::MemoryStore;

/// Record source over a synthetic seasonal series, with a switchable
/// outage and a fetch counter.
struct SyntheticSource {
    months: usize,
    delay: Duration,
    failing: AtomicBool,
    fetches: AtomicUsize,
}

impl SyntheticSource {
    fn new(months: usize, delay: Duration) -> Self {
        Self {
            months,
            delay,
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl RecordSource for SyntheticSource {
    fn records(&self, _resource_id: &str) -> Result<Vec<JsonRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClimateError::DataAcquisition(
                "synthetic outage".to_string(),
            ));
        }

        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Ok((0..self.months)
            .map(|i| {
                let date = start + Months::new(i as u32);
                let value = 27.0 + (i as f64 * std::f64::consts::PI / 6.0).sin();
                let mut record = JsonRecord::new();
                record.insert("_id".to_string(), serde_json::json!(i + 1));
                record.insert(
                    "month".to_string(),
                    serde_json::json!(date.format("%Y-%m").to_string()),
                );
                // Upstream cells arrive as strings.
                record.insert(
                    "mean_temp".to_string(),
                    serde_json::json!(format!("{:.2}", value)),
                );
                record
            })
            .collect())
    }
}

fn test_config() -> ForecastConfig {
    ForecastConfig {
        resource_ids: vec!["synthetic".to_string()],
        // Keep the worker's schedule poll out of the test window.
        poll_interval_secs: 3600,
        model: ModelConfig {
            window_len: 12,
            hidden: 6,
            dropout: 0.5,
            learning_rate: 0.01,
            epochs: 15,
        },
        ..ForecastConfig::default()
    }
}

#[test]
fn test_retrain_publishes_consistent_snapshot() {
    let source = Arc::new(SyntheticSource::new(36, Duration::ZERO));
    let manager = LifecycleManager::new(test_config(), source, Arc::new(MemoryStore::new()));

    assert_eq!(manager.state(), LifecycleState::Uninitialized);
    assert!(manager.retrain_once());
    assert_eq!(manager.state(), LifecycleState::Ready);

    let snapshot = manager.current_snapshot().unwrap();
    // 24 training months before the cutoff, 12 evaluation months after.
    assert_eq!(snapshot.split.train.len(), 24);
    assert_eq!(snapshot.split.eval.len(), 12);
    assert_eq!(snapshot.train_norm.len(), 24);
    assert_eq!(snapshot.loss.len(), 15);
    // The scaler was fit on the training segment it is published with.
    let min = snapshot
        .split
        .train
        .values
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    assert_eq!(snapshot.scaler.min(), min);
}

#[test]
fn test_single_flight_absorbs_concurrent_trigger() {
    let source = Arc::new(SyntheticSource::new(36, Duration::from_millis(400)));
    let manager = LifecycleManager::new(
        test_config(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        Arc::new(MemoryStore::new()),
    );

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.retrain_once()
            })
        })
        .collect();

    let ran: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    // Exactly one trigger executed; the other was absorbed.
    assert_eq!(ran.iter().filter(|r| **r).count(), 1);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(manager.state(), LifecycleState::Ready);
}

#[test]
fn test_failed_initial_training_stays_uninitialized() {
    let source = Arc::new(SyntheticSource::new(36, Duration::ZERO));
    source.set_failing(true);
    let manager = LifecycleManager::new(
        test_config(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        Arc::new(MemoryStore::new()),
    );

    assert!(manager.retrain_once());
    assert_eq!(manager.state(), LifecycleState::Uninitialized);
    assert!(manager.current_snapshot().is_none());
}

#[test]
fn test_failed_retrain_keeps_previous_snapshot() {
    let source = Arc::new(SyntheticSource::new(36, Duration::ZERO));
    let manager = LifecycleManager::new(
        test_config(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        Arc::new(MemoryStore::new()),
    );

    assert!(manager.retrain_once());
    let published = manager.current_snapshot().unwrap();

    source.set_failing(true);
    assert!(manager.retrain_once());

    // Failure left the system Ready on the prior snapshot.
    assert_eq!(manager.state(), LifecycleState::Ready);
    let retained = manager.current_snapshot().unwrap();
    assert!(Arc::ptr_eq(&published, &retained));
}

#[test]
fn test_ensure_worker_is_idempotent() {
    let source = Arc::new(SyntheticSource::new(36, Duration::from_millis(200)));
    let manager = LifecycleManager::new(
        test_config(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        Arc::new(MemoryStore::new()),
    );

    assert!(manager.ensure_worker());
    assert!(!manager.ensure_worker());
    assert!(!manager.ensure_worker());

    // The single worker eventually publishes from exactly one fetch.
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    while manager.current_snapshot().is_none() {
        assert!(
            std::time::Instant::now() < deadline,
            "worker never published a snapshot"
        );
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(source.fetch_count(), 1);
}
