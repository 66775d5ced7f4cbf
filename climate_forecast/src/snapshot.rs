//! Published model snapshots
//!
//! The externally visible unit of model state: scaler, trained network,
//! split and series, published together so readers never observe a scaler
//! from one training run paired with weights from another.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use climate_math::scaling::MinMaxScaler;

use crate::model::LstmNetwork;
use crate::series::{MonthlySeries, TrainTestSplit};

/// One complete, internally consistent training outcome.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    /// The full monthly series the model was derived from
    pub series: MonthlySeries,
    /// Training/evaluation partition
    pub split: TrainTestSplit,
    /// Scaler fit on the training segment; sole point of denormalization
    pub scaler: MinMaxScaler,
    /// Trained network; consumed through single-step inference only
    pub network: LstmNetwork,
    /// Normalized training segment, for seeding the rolling window
    pub train_norm: Vec<f64>,
    /// Per-epoch training loss curve
    pub loss: Vec<f64>,
    /// When training completed
    pub trained_at: DateTime<Utc>,
}

/// Shared snapshot storage; `get` and `set` are atomic and readers never
/// observe a partially written snapshot.
pub trait SnapshotStore: Send + Sync {
    /// The current snapshot under the key, if any.
    fn get(&self, key: &str) -> Option<Arc<ModelSnapshot>>;

    /// Publish a snapshot, replacing any previous one under the key.
    fn set(&self, key: &str, snapshot: Arc<ModelSnapshot>);
}

/// Process-local snapshot store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Arc<ModelSnapshot>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Arc<ModelSnapshot>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, snapshot: Arc<ModelSnapshot>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.to_string(), snapshot);
    }
}
