//! Collaborator traits.
//!
//! Log storage, metric storage and event publishing are supplied by the
//! embedding application. Implementations must be `Send + Sync` so a single
//! store can back concurrent investigations.

use crate::core::{Result, TimeRange};
use crate::monitoring::events::DomainEvent;
use crate::monitoring::logging::LogEntry;
use crate::monitoring::metrics::Metric;
use crate::store::filter::{LogFilter, MetricFilter};
use async_trait::async_trait;

/// Append-only log storage with range queries.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append an entry.
    async fn append(&self, entry: LogEntry) -> Result<()>;

    /// Entries matching a filter, ascending by timestamp.
    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<u64>;
}

/// Metric sample storage.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Store a sample.
    async fn save(&self, metric: Metric) -> Result<()>;

    /// Samples of `name` from the last `minutes`.
    async fn find_recent_metrics(&self, name: &str, minutes: u32) -> Result<Vec<Metric>>;

    /// Samples inside `range` matching `filter`, ascending by timestamp.
    async fn find_by_query(&self, range: &TimeRange, filter: &MetricFilter) -> Result<Vec<Metric>>;
}

/// Destination for domain events.
///
/// Publishing is at-least-once from the caller's point of view: a failure
/// leaves the event in its outbox for a later attempt.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: &DomainEvent) -> Result<()>;
}
