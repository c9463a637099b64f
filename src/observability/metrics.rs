//! In-process metrics.
//!
//! Counters emitted through the `metrics` facade are kept in memory so a
//! session can report them when it ends. Gauges and histograms are dropped.

use crate::{Error, Result};
use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counter registry usable as a `metrics` recorder.
///
/// Clones share the same counters, so one clone can be installed while
/// another is kept to read the values back.
///
/// Counters are keyed by name, then labels in emission order, e.g.
/// `scan_rejected_total{reason="invalid_code"}`.
#[derive(Debug, Clone, Default)]
pub struct CounterRegistry {
    counters: Arc<Mutex<BTreeMap<String, Arc<AtomicU64>>>>,
}

impl CounterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a clone of this registry as the global recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if a global recorder is already installed.
    pub fn install(&self) -> Result<()> {
        metrics::set_global_recorder(self.clone()).map_err(|_| Error::OperationFailed {
            operation: "install_metrics_recorder".to_string(),
            cause: "a metrics recorder is already installed".to_string(),
        })
    }

    /// Returns the value of a counter, or 0 if it was never emitted.
    #[must_use]
    pub fn get(&self, key: &str) -> u64 {
        self.lock()
            .get(key)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Sums every counter whose name is `name`, across all label sets.
    #[must_use]
    pub fn total(&self, name: &str) -> u64 {
        self.lock()
            .iter()
            .filter(|(key, _)| key.split('{').next() == Some(name))
            .map(|(_, counter)| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Returns all counters.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock()
            .iter()
            .map(|(key, counter)| (key.clone(), counter.load(Ordering::Relaxed)))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<AtomicU64>>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}=\"{}\"", label.key(), label.value()))
        .collect();

    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CounterRegistry {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let counter = Arc::clone(self.lock().entry(key_string(key)).or_default());
        Counter::from_arc(counter)
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
