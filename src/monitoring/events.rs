//! Domain events and the per-aggregate outbox.
//!
//! Mutating calls on an aggregate enqueue events here. A separate drain step
//! hands them to an [`EventPublisher`]; publishing never touches aggregate state.

use crate::core::{Result, Timestamp};
use crate::monitoring::alerts::{AlertId, NotificationChannel};
use crate::monitoring::health::{HealthId, HealthStatus};
use crate::monitoring::threshold::Severity;
use crate::store::EventPublisher;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An alert crossed its threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertTriggered {
    pub alert_id: AlertId,
    pub alert_name: String,
    pub metric_name: String,
    /// Value that crossed the threshold
    pub value: f64,
    /// Rendered condition, e.g. "greater than 80"
    pub condition: String,
    pub severity: Severity,
    pub channels: Vec<NotificationChannel>,
    pub trigger_count: u64,
    pub occurred_at: Timestamp,
}

/// A triggered alert was resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertResolved {
    pub alert_id: AlertId,
    pub alert_name: String,
    /// Resolved by evaluation rather than by an operator
    pub auto_resolved: bool,
    pub occurred_at: Timestamp,
}

/// A component moved to a different health status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthChanged {
    pub health_id: HealthId,
    pub component: String,
    pub previous: HealthStatus,
    pub current: HealthStatus,
    pub occurred_at: Timestamp,
}

/// A component entered Critical or Down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalAlert {
    pub health_id: HealthId,
    pub component: String,
    pub status: HealthStatus,
    /// Short category, e.g. "availability" or "cpu"
    pub alert_type: String,
    pub message: String,
    pub occurred_at: Timestamp,
}

/// Events emitted by alerts and health aggregates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    AlertTriggered(AlertTriggered),
    AlertResolved(AlertResolved),
    HealthChanged(HealthChanged),
    CriticalAlert(CriticalAlert),
}

impl DomainEvent {
    /// Event name.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::AlertTriggered(_) => "AlertTriggered",
            DomainEvent::AlertResolved(_) => "AlertResolved",
            DomainEvent::HealthChanged(_) => "HealthChanged",
            DomainEvent::CriticalAlert(_) => "CriticalAlert",
        }
    }

    /// When the event happened.
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            DomainEvent::AlertTriggered(e) => e.occurred_at,
            DomainEvent::AlertResolved(e) => e.occurred_at,
            DomainEvent::HealthChanged(e) => e.occurred_at,
            DomainEvent::CriticalAlert(e) => e.occurred_at,
        }
    }
}

/// Buffer of events not yet handed to a publisher.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventOutbox {
    pending: Vec<DomainEvent>,
}

impl EventOutbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event.
    pub fn push(&mut self, event: DomainEvent) {
        self.pending.push(event);
    }

    /// Events waiting to be published.
    pub fn uncommitted(&self) -> &[DomainEvent] {
        &self.pending
    }

    /// Forget every pending event.
    pub fn mark_committed(&mut self) {
        self.pending.clear();
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Publish pending events in order.
    ///
    /// Successfully published events are removed. On the first failure the
    /// remaining events stay pending and the error is returned.
    pub async fn publish_to(&mut self, publisher: &dyn EventPublisher) -> Result<usize> {
        let mut published = 0;
        let mut failure = None;

        for event in &self.pending {
            match publisher.publish(event).await {
                Ok(()) => published += 1,
                Err(err) => {
                    warn!(event = event.name(), error = %err, "event publish failed");
                    failure = Some(err);
                    break;
                }
            }
        }

        self.pending.drain(..published);

        match failure {
            Some(err) => Err(err),
            None => Ok(published),
        }
    }
}
