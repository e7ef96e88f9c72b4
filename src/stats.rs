//! Stats sinks.
//!
//! A sink only needs to accumulate increments by key. Loaders never read
//! counters back, and they never decide when counters are flushed: the owner
//! of the sink dumps it when the surrounding job ends.

use crate::SinkError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// External accumulator for usage labels.
///
/// Implementations are shared by every loader of a crawl, possibly across
/// worker threads, and must synchronize internally.
pub trait StatsSink: Send + Sync {
    /// Add one to the counter stored under `label`.
    fn increment(&self, label: &str) -> Result<(), SinkError>;
}

/// Thread-safe in-memory sink.
#[derive(Debug)]
pub struct MemoryStats {
    values: Mutex<BTreeMap<String, u64>>,
    started_at: DateTime<Utc>,
}

/// Counters captured by [`MemoryStats::dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDump {
    pub started_at: DateTime<Utc>,
    pub dumped_at: DateTime<Utc>,
    pub values: BTreeMap<String, u64>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self { values: Mutex::new(BTreeMap::new()), started_at: Utc::now() }
    }

    pub fn get_value(&self, key: &str) -> Option<u64> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).copied()
    }

    /// Copy of every counter, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Capture the current counters. The sink keeps accumulating afterwards.
    pub fn dump(&self) -> StatsDump {
        let values = self.snapshot();
        info!(counters = values.len(), started_at = %self.started_at, "dumping parser stats");
        StatsDump { started_at: self.started_at, dumped_at: Utc::now(), values }
    }
}

impl Default for MemoryStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSink for MemoryStats {
    fn increment(&self, label: &str) -> Result<(), SinkError> {
        let mut values = self.values.lock().map_err(|_| "stats lock poisoned")?;
        *values.entry(label.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

impl StatsDump {
    /// Counters whose label marks a rule that produced nothing.
    pub fn missing(&self) -> impl Iterator<Item = (&str, u64)> {
        let suffix = format!("/{}", crate::MISSING_SUFFIX);
        self.values.iter().filter(move |(key, _)| key.ends_with(&suffix)).map(|(key, count)| (key.as_str(), *count))
    }
}
