//! Monitoring Module
//!
//! Provides the live evaluation side of Vigil:
//! - Typed metric samples
//! - Threshold alerts with cooldown and hourly caps
//! - Component health classification
//! - Domain events and outboxes
//! - Structured log records

pub mod alerts;
pub mod events;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod threshold;

pub use alerts::{
    Alert, AlertConfiguration, AlertDefinition, AlertId, AlertManager, AlertStatus,
    NotificationChannel,
};
pub use events::{DomainEvent, EventOutbox};
pub use health::{
    ComponentType, HealthClassifier, HealthMetrics, HealthStatus, HealthSummary,
    HealthThresholds, SystemHealth, Tier,
};
pub use logging::{LogCategory, LogContext, LogEntry, LogLevel};
pub use metrics::{Metric, MetricType, MetricValue};
pub use threshold::{Severity, Threshold, ThresholdDefinition, ThresholdOperator};
