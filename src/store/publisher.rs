//! Event publisher implementations.

use crate::core::{Error, Result};
use crate::monitoring::events::DomainEvent;
use crate::store::backend::EventPublisher;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Keeps every published event in memory.
///
/// Can be told to start failing after a number of successful publishes.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
    fail_after: Option<usize>,
}

impl RecordingPublisher {
    /// Create a publisher that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish once `successes` events were accepted.
    pub fn fail_after(mut self, successes: usize) -> Self {
        self.fail_after = Some(successes);
        self
    }

    /// Snapshot of accepted events, in publish order.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| Error::Publish("recording publisher lock poisoned".to_string()))?;

        if let Some(limit) = self.fail_after {
            if events.len() >= limit {
                return Err(Error::Publish(format!(
                    "publisher rejected {} after {} events",
                    event.name(),
                    limit
                )));
            }
        }

        events.push(event.clone());
        Ok(())
    }
}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        info!(
            event = event.name(),
            occurred_at = %event.occurred_at().to_rfc3339(),
            payload = %payload,
            "domain event"
        );
        Ok(())
    }
}

/// Publishes every event to all targets concurrently.
///
/// Succeeds only when every target accepted the event.
#[derive(Default, Clone)]
pub struct FanoutPublisher {
    targets: Vec<(String, Arc<dyn EventPublisher>)>,
}

impl FanoutPublisher {
    /// Create a fan-out with no targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named target.
    pub fn with_target(mut self, name: &str, target: Arc<dyn EventPublisher>) -> Self {
        self.targets.push((name.to_string(), target));
        self
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let results = join_all(self.targets.iter().map(|(_, t)| t.publish(event))).await;

        let failed: Vec<&str> = self
            .targets
            .iter()
            .zip(results.iter())
            .filter_map(|((name, _), result)| match result {
                Ok(()) => None,
                Err(err) => {
                    warn!(target_name = %name, event = event.name(), error = %err, "fan-out target failed");
                    Some(name.as_str())
                }
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Publish(format!(
                "{} of {} targets failed: {}",
                failed.len(),
                self.targets.len(),
                failed.join(", ")
            )))
        }
    }
}
