//! Incident analysis results.
//!
//! Everything here is computed on demand and never persisted.

use crate::core::{Result, TimeRange, Timestamp};
use crate::incident::hypothesis::RootCauseHypothesis;
use crate::monitoring::logging::LogEntry;
use crate::monitoring::metrics::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fixed-width slice of the error progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBucket {
    pub start: Timestamp,
    pub end: Timestamp,
    pub count: usize,
}

/// Error-level activity over a lookback window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    /// Scanned window (start exclusive)
    pub window: TimeRange,
    /// Error and Fatal entries in the window
    pub error_count: usize,
    /// Histogram keyed by extracted error type
    pub error_types: BTreeMap<String, usize>,
    /// Distinct users, sorted
    pub affected_users: Vec<String>,
    /// Fatal entries and entries mentioning database, timeout or crash
    pub critical_errors: Vec<LogEntry>,
    /// Counts per bucket, oldest first
    pub progression: Vec<ErrorBucket>,
}

impl ErrorAnalysis {
    /// The most frequent error type. Ties go to the alphabetically first.
    pub fn dominant_error_type(&self) -> Option<(&str, usize)> {
        self.error_types
            .iter()
            .fold(None, |best: Option<(&str, usize)>, (name, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((name.as_str(), count)),
            })
    }

    /// Bucket with the most errors.
    pub fn peak_bucket(&self) -> Option<&ErrorBucket> {
        self.progression
            .iter()
            .rev()
            .max_by_key(|b| b.count)
            .filter(|b| b.count > 0)
    }
}

/// Activity of a single user leading up to an incident.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserJourney {
    pub user_id: String,
    pub window: TimeRange,
    /// Messages of info-level application entries, oldest first
    pub actions_performed: Vec<String>,
    pub last_successful_action: Option<LogEntry>,
    pub first_error: Option<LogEntry>,
    /// Distinct workflow ids in first-seen order
    pub workflows_attempted: Vec<String>,
    pub total_events: usize,
}

impl UserJourney {
    /// Whether the user hit an error in the window.
    pub fn has_errors(&self) -> bool {
        self.first_error.is_some()
    }
}

/// Strength of the link between a metric sample and nearby logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationStrength {
    High,
    Medium,
    Low,
}

/// A metric sample with the logs around it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub metric: Metric,
    pub related_logs: Vec<LogEntry>,
    pub strength: CorrelationStrength,
}

/// Headline figures of an incident report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub incident_time: Timestamp,
    pub description: String,
    /// Timeline window
    pub window: TimeRange,
    pub total_logs: usize,
    pub error_count: usize,
    pub critical_error_count: usize,
    pub affected_users: Vec<String>,
    pub affected_workflows: Vec<String>,
}

/// Full incident report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub summary: IncidentSummary,
    pub timeline: Vec<LogEntry>,
    pub error_analysis: ErrorAnalysis,
    pub user_journeys: Vec<UserJourney>,
    pub correlation: Vec<MetricCorrelation>,
    pub root_cause_hypotheses: Vec<RootCauseHypothesis>,
    pub recommended_actions: Vec<String>,
}

impl IncidentReport {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Correlations of the given strength.
    pub fn correlations_with(&self, strength: CorrelationStrength) -> Vec<&MetricCorrelation> {
        self.correlation
            .iter()
            .filter(|c| c.strength == strength)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{minutes, now};

    fn analysis(types: &[(&str, usize)], buckets: &[usize]) -> ErrorAnalysis {
        let end = now();
        let start = end - minutes(5 * buckets.len() as i64);
        ErrorAnalysis {
            window: TimeRange::new(start, end).unwrap(),
            error_count: buckets.iter().sum(),
            error_types: types.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            affected_users: Vec::new(),
            critical_errors: Vec::new(),
            progression: buckets
                .iter()
                .enumerate()
                .map(|(i, &count)| ErrorBucket {
                    start: start + minutes(5 * i as i64),
                    end: start + minutes(5 * (i as i64 + 1)),
                    count,
                })
                .collect(),
        }
    }

    #[test]
    fn test_dominant_error_type() {
        let a = analysis(&[("Timeout", 3), ("DatabaseError", 5), ("Auth", 5)], &[13]);
        assert_eq!(a.dominant_error_type(), Some(("Auth", 5)));
        assert_eq!(analysis(&[], &[0]).dominant_error_type(), None);
    }

    #[test]
    fn test_peak_bucket() {
        let a = analysis(&[], &[1, 4, 4, 2]);
        let peak = a.peak_bucket().unwrap();
        assert_eq!(peak.count, 4);
        assert_eq!(peak.start, a.progression[1].start);

        assert!(analysis(&[], &[0, 0]).peak_bucket().is_none());
    }
}
