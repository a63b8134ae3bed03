//! Incident Correlation Module
//!
//! Given an incident time, pulls logs and metrics from the stores over
//! overlapping windows and assembles a report:
//! - Timeline of surrounding logs
//! - Error histogram, critical errors and bucketed progression
//! - Per-user journeys
//! - Metric to log correlations
//! - Rule-based root-cause hypotheses with recommended actions

pub mod config;
pub mod engine;
pub mod extractor;
pub mod hypothesis;
pub mod report;

pub use config::CorrelationConfig;
pub use engine::IncidentCorrelationEngine;
pub use extractor::{ErrorTypeExtractor, PrefixErrorTypeExtractor, UNKNOWN_ERROR_TYPE};
pub use hypothesis::{HypothesisKind, HypothesisRule, Pattern, RootCauseHypothesis};
pub use report::{
    CorrelationStrength, ErrorAnalysis, ErrorBucket, IncidentReport, IncidentSummary,
    MetricCorrelation, UserJourney,
};
