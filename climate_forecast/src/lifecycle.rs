//! Model lifecycle
//!
//! Owns the end-to-end retrain cycle: acquire, prepare, window, train,
//! publish. One background worker runs the initial training and every
//! scheduled retrain serially; request handlers only ever read the
//! published snapshot. A failed cycle is logged and leaves the previous
//! snapshot (or none) current.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{Local, Utc};
use log::{error, info, warn};

use crate::config::ForecastConfig;
use crate::data::{self, RecordSource};
use crate::error::Result;
use crate::model::{set_determinism, LstmNetwork};
use crate::schedule::WeeklyCadence;
use crate::series;
use crate::snapshot::{ModelSnapshot, SnapshotStore};
use crate::window::TrainingWindows;

/// Lifecycle states of the published model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No training has succeeded and none is running
    Uninitialized,
    /// First training in progress, nothing published yet
    Training,
    /// A snapshot is published and no retrain is running
    Ready,
    /// A snapshot is published and a replacement is being trained
    Retraining,
}

struct Inner {
    config: ForecastConfig,
    source: Arc<dyn RecordSource>,
    store: Arc<dyn SnapshotStore>,
    state: Mutex<LifecycleState>,
    worker_started: AtomicBool,
}

/// Coordinates training, publication and the retrain schedule.
///
/// Cheap to clone; every clone shares the same state, so the single-flight
/// and idempotent-worker guarantees hold across clones.
#[derive(Clone)]
pub struct LifecycleManager {
    inner: Arc<Inner>,
}

impl LifecycleManager {
    /// Create a manager over the given source and snapshot store.
    pub fn new(
        config: ForecastConfig,
        source: Arc<dyn RecordSource>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                source,
                store,
                state: Mutex::new(LifecycleState::Uninitialized),
                worker_started: AtomicBool::new(false),
            }),
        }
    }

    /// The configuration the manager runs with.
    pub fn config(&self) -> &ForecastConfig {
        &self.inner.config
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The currently published snapshot, if any.
    pub fn current_snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        self.inner.store.get(&self.inner.config.cache_key)
    }

    /// Start the background worker if it is not already running.
    ///
    /// Idempotent: concurrent callers spawn at most one worker. Returns
    /// whether this call started it.
    pub fn ensure_worker(&self) -> bool {
        if self
            .inner
            .worker_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let manager = self.clone();
        let spawned = thread::Builder::new()
            .name("model-lifecycle".to_string())
            .spawn(move || manager.worker_loop());
        match spawned {
            Ok(_) => true,
            Err(e) => {
                error!("failed to spawn lifecycle worker: {}", e);
                self.inner.worker_started.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Run one retrain cycle unless one is already in progress.
    ///
    /// Single-flight: a concurrent trigger during Training/Retraining is
    /// absorbed and reported as `false`. Failures are contained here; the
    /// previously published snapshot stays current.
    pub fn retrain_once(&self) -> bool {
        {
            let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            match *state {
                LifecycleState::Training | LifecycleState::Retraining => {
                    info!("retrain already in progress; trigger absorbed");
                    return false;
                }
                LifecycleState::Uninitialized => *state = LifecycleState::Training,
                LifecycleState::Ready => *state = LifecycleState::Retraining,
            }
        }

        let outcome = self.run_pipeline();
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        match outcome {
            Ok(snapshot) => {
                self.inner.store.set(&self.inner.config.cache_key, snapshot);
                *state = LifecycleState::Ready;
                info!("model trained and published on {}", Utc::now());
            }
            Err(e) => {
                warn!("retrain failed: {}; keeping the previous snapshot", e);
                *state = if self.current_snapshot().is_some() {
                    LifecycleState::Ready
                } else {
                    LifecycleState::Uninitialized
                };
            }
        }
        true
    }

    /// The full acquire → prepare → window → train pipeline.
    fn run_pipeline(&self) -> Result<Arc<ModelSnapshot>> {
        let config = &self.inner.config;
        let table = data::acquire(self.inner.source.as_ref(), config)?;
        let prepared = series::prepare(&table, config)?;
        let windows = TrainingWindows::new(&prepared.train_norm, config.model.window_len)?;

        info!("training model on {} window(s)", windows.len());
        let mut network = LstmNetwork::new(&config.model);
        let loss = network.train(&windows, config.model.epochs)?;
        if let Some(last) = loss.last() {
            info!("training finished with loss {:.6}", last);
        }

        Ok(Arc::new(ModelSnapshot {
            series: prepared.series,
            split: prepared.split,
            scaler: prepared.scaler,
            network,
            train_norm: prepared.train_norm,
            loss,
            trained_at: Utc::now(),
        }))
    }

    /// Initial training followed by the weekly retrain loop.
    fn worker_loop(&self) {
        // Seed every pseudo-random source before the first model exists.
        set_determinism(self.inner.config.seed);

        info!("initializing model");
        self.retrain_once();

        let mut cadence = WeeklyCadence::new(self.inner.config.retrain_weekday);
        loop {
            thread::sleep(Duration::from_secs(self.inner.config.poll_interval_secs));
            let today = Local::now().date_naive();
            if cadence.fires_on(today) {
                info!("weekly retrain fired on {}", today);
                self.retrain_once();
            }
        }
    }
}
