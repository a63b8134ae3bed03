//! # Vigil - Alerting, Health and Incident Correlation
//!
//! - **Monitoring**: threshold alerts with cooldown and hourly caps, tiered
//!   component health, domain events buffered in per-aggregate outboxes
//! - **Incident**: reconstructs timelines, error patterns, user journeys and
//!   metric correlations around an incident, with root-cause hypotheses
//! - **Store**: async log/metric store and event publisher traits with
//!   in-memory implementations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::incident::IncidentCorrelationEngine;
//! use vigil::monitoring::{Alert, AlertConfiguration, MetricValue, Threshold, Severity};
//! use vigil::store::{InMemoryLogStore, InMemoryMetricStore};
//!
//! #[tokio::main]
//! async fn main() -> vigil::Result<()> {
//!     let threshold = Threshold::greater_than(80.0)?.with_severity(Severity::Critical);
//!     let mut alert = Alert::new("cpu high", "cpu_usage", threshold, AlertConfiguration::default())?;
//!     if alert.evaluate(&MetricValue::percentage(92.0)?) {
//!         println!("{} triggered", alert.name());
//!     }
//!
//!     let engine = IncidentCorrelationEngine::new(
//!         Arc::new(InMemoryLogStore::new()),
//!         Arc::new(InMemoryMetricStore::new()),
//!     );
//!     let report = engine
//!         .generate_incident_report(vigil::core::now(), "checkout failures", None, None)
//!         .await?;
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod incident;
pub mod monitoring;
pub mod store;

pub use core::error::{Error, Result};
