//! In-memory store implementations.
//!
//! Useful for tests and for embedding Vigil next to an existing log pipeline.

use crate::core::{now, Error, Result, TimeRange};
use crate::monitoring::logging::LogEntry;
use crate::monitoring::metrics::Metric;
use crate::store::backend::{LogStore, MetricStore};
use crate::store::filter::{LogFilter, MetricFilter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::debug;

/// Default number of log entries kept in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

fn poisoned(what: &str) -> Error {
    Error::Store(format!("{} lock poisoned", what))
}

/// Bounded log buffer. The oldest entry is evicted when full.
pub struct InMemoryLogStore {
    /// Log buffer
    entries: RwLock<VecDeque<LogEntry>>,
    /// Maximum buffer size
    capacity: usize,
}

impl InMemoryLogStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create a store holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries.
    pub fn clear(&self) -> Result<()> {
        self.entries.write().map_err(|_| poisoned("log buffer"))?.clear();
        Ok(())
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned("log buffer"))?;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        debug!(level = %entry.level, source = %entry.source, "log entry appended");
        entries.push_back(entry);
        Ok(())
    }

    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned("log buffer"))?;
        let mut results: Vec<LogEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        drop(entries);

        results.sort_by_key(|e| e.timestamp);

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn count(&self) -> Result<u64> {
        let entries = self.entries.read().map_err(|_| poisoned("log buffer"))?;
        Ok(entries.len() as u64)
    }
}

/// Unbounded metric sample store.
pub struct InMemoryMetricStore {
    metrics: RwLock<Vec<Metric>>,
}

impl InMemoryMetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.metrics.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryMetricStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn save(&self, metric: Metric) -> Result<()> {
        let mut metrics = self.metrics.write().map_err(|_| poisoned("metric store"))?;
        debug!(metric = %metric.name, value = metric.value.value(), "metric saved");
        metrics.push(metric);
        Ok(())
    }

    async fn find_recent_metrics(&self, name: &str, minutes: u32) -> Result<Vec<Metric>> {
        let range = TimeRange::last_minutes(now(), minutes);
        self.find_by_query(&range, &MetricFilter::new().by_name(name)).await
    }

    async fn find_by_query(&self, range: &TimeRange, filter: &MetricFilter) -> Result<Vec<Metric>> {
        let metrics = self.metrics.read().map_err(|_| poisoned("metric store"))?;
        let mut results: Vec<Metric> = metrics
            .iter()
            .filter(|m| range.contains(m.timestamp()) && filter.matches(m))
            .cloned()
            .collect();
        drop(metrics);

        results.sort_by_key(|m| m.timestamp());
        Ok(results)
    }
}
