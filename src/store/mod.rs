//! Storage and Publishing Module
//!
//! Async collaborator traits used by the monitoring aggregates and the
//! incident engine, with in-memory implementations.

pub mod backend;
pub mod filter;
pub mod memory;
pub mod publisher;

pub use backend::{EventPublisher, LogStore, MetricStore};
pub use filter::{LogFilter, MetricFilter};
pub use memory::{InMemoryLogStore, InMemoryMetricStore, DEFAULT_LOG_CAPACITY};
pub use publisher::{FanoutPublisher, RecordingPublisher, TracingPublisher};
