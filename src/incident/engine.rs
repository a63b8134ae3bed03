//! Incident correlation engine.
//!
//! Reconstructs what happened around an incident time from the log and metric
//! stores. Every operation is a read; the engine holds no mutable state and
//! can serve concurrent investigations.

use crate::core::{minutes, Error, Result, TimeRange, Timestamp};
use crate::incident::config::CorrelationConfig;
use crate::incident::extractor::{ErrorTypeExtractor, PrefixErrorTypeExtractor};
use crate::incident::hypothesis::{generate_hypotheses, recommended_actions, Evidence, HypothesisRule};
use crate::incident::report::{
    CorrelationStrength, ErrorAnalysis, ErrorBucket, IncidentReport, IncidentSummary,
    MetricCorrelation, UserJourney,
};
use crate::monitoring::logging::{LogCategory, LogEntry, LogLevel};
use crate::monitoring::metrics::{Metric, MetricType};
use crate::store::{LogFilter, LogStore, MetricFilter, MetricStore};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

const CRITICAL_KEYWORDS: [&str; 3] = ["database", "timeout", "crash"];

/// Correlates logs and metrics around an incident.
pub struct IncidentCorrelationEngine {
    logs: Arc<dyn LogStore>,
    metrics: Arc<dyn MetricStore>,
    extractor: Arc<dyn ErrorTypeExtractor>,
    rules: Vec<HypothesisRule>,
    config: CorrelationConfig,
}

impl IncidentCorrelationEngine {
    /// Create an engine with default windows and rules.
    pub fn new(logs: Arc<dyn LogStore>, metrics: Arc<dyn MetricStore>) -> Self {
        Self {
            logs,
            metrics,
            extractor: Arc::new(PrefixErrorTypeExtractor),
            rules: HypothesisRule::defaults(),
            config: CorrelationConfig::default(),
        }
    }

    /// Replace the error type extractor.
    pub fn with_extractor(mut self, extractor: impl ErrorTypeExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Replace the hypothesis rule table.
    pub fn with_rules(mut self, rules: Vec<HypothesisRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Replace windows and thresholds.
    pub fn with_config(mut self, config: CorrelationConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Current configuration.
    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Logs in `[t - window, t + window]`, oldest first.
    ///
    /// `filters` narrows by user, workflow, request, component or level; its
    /// own range is ignored.
    pub async fn collect_incident_logs(
        &self,
        incident_time: Timestamp,
        window_minutes: u32,
        filters: Option<&LogFilter>,
    ) -> Result<Vec<LogEntry>> {
        let mut filter = LogFilter::new().in_range(TimeRange::around(incident_time, window_minutes));
        if let Some(extra) = filters {
            filter = filter.merge(extra);
        }

        let mut entries = self.logs.query(&filter).await?;
        entries.sort_by_key(|e| e.timestamp);
        debug!(count = entries.len(), window_minutes, "collected incident logs");
        Ok(entries)
    }

    /// Error-level activity in `(t - lookback, t]`.
    ///
    /// Fails with a validation error when `lookback_minutes` exceeds
    /// `max_lookback_minutes`.
    pub async fn analyze_error_pattern(
        &self,
        incident_time: Timestamp,
        lookback_minutes: u32,
    ) -> Result<ErrorAnalysis> {
        if lookback_minutes > self.config.max_lookback_minutes {
            return Err(Error::validation(format!(
                "lookback of {} minutes exceeds the maximum of {}",
                lookback_minutes, self.config.max_lookback_minutes
            )));
        }

        let window = TimeRange::last_minutes(incident_time, lookback_minutes);
        let filter = LogFilter::new().in_range(window).min_level(LogLevel::Error);
        let errors: Vec<LogEntry> = self
            .logs
            .query(&filter)
            .await?
            .into_iter()
            .filter(|e| e.timestamp > window.start)
            .collect();

        let mut error_types: BTreeMap<String, usize> = BTreeMap::new();
        let mut affected_users = BTreeSet::new();
        let mut critical_errors = Vec::new();

        for entry in &errors {
            *error_types.entry(self.extractor.extract(entry)).or_insert(0) += 1;
            if let Some(user) = entry.user_id() {
                affected_users.insert(user.to_string());
            }
            if is_critical(entry) {
                critical_errors.push(entry.clone());
            }
        }
        critical_errors.sort_by_key(|e| e.timestamp);

        Ok(ErrorAnalysis {
            window,
            error_count: errors.len(),
            error_types,
            affected_users: affected_users.into_iter().collect(),
            critical_errors,
            progression: self.progression(&window, lookback_minutes, &errors),
        })
    }

    /// Fixed-width buckets from the window start. Entries on the upper edge
    /// land in the last bucket.
    fn progression(&self, window: &TimeRange, lookback_minutes: u32, errors: &[LogEntry]) -> Vec<ErrorBucket> {
        let width = self.config.bucket_minutes.max(1);
        let bucket_count = lookback_minutes.div_ceil(width).max(1) as usize;
        let width_secs = i64::from(width) * 60;

        let mut buckets: Vec<ErrorBucket> = (0..bucket_count)
            .map(|i| {
                let start = window.start + minutes(i as i64 * i64::from(width));
                let end = (start + minutes(i64::from(width))).min(window.end);
                ErrorBucket { start, end, count: 0 }
            })
            .collect();

        for entry in errors {
            let offset = (entry.timestamp - window.start).num_seconds().max(0);
            let index = ((offset / width_secs) as usize).min(bucket_count - 1);
            buckets[index].count += 1;
        }

        buckets
    }

    /// What one user did in `(t - lookback, t]`.
    pub async fn trace_user_journey(
        &self,
        user_id: &str,
        incident_time: Timestamp,
        lookback_minutes: u32,
    ) -> Result<UserJourney> {
        let window = TimeRange::last_minutes(incident_time, lookback_minutes);
        let filter = LogFilter::new().in_range(window).by_user(user_id);
        let mut entries: Vec<LogEntry> = self
            .logs
            .query(&filter)
            .await?
            .into_iter()
            .filter(|e| e.timestamp > window.start)
            .collect();
        entries.sort_by_key(|e| e.timestamp);

        let successes: Vec<&LogEntry> = entries
            .iter()
            .filter(|e| e.level == LogLevel::Info && e.category == LogCategory::Application)
            .collect();

        let mut seen = HashSet::new();
        let workflows_attempted = entries
            .iter()
            .filter_map(|e| e.workflow_id())
            .filter(|w| seen.insert(*w))
            .map(str::to_string)
            .collect();

        Ok(UserJourney {
            user_id: user_id.to_string(),
            window,
            actions_performed: successes.iter().map(|e| e.message.clone()).collect(),
            last_successful_action: successes.last().map(|e| (*e).clone()),
            first_error: entries.iter().find(|e| e.level.is_error()).cloned(),
            workflows_attempted,
            total_events: entries.len(),
        })
    }

    /// Metric samples in `[t - window, t + window]` with the logs near each.
    ///
    /// Samples with no nearby logs are dropped. Output follows sample time.
    pub async fn correlate_with_metrics(
        &self,
        incident_time: Timestamp,
        window_minutes: u32,
    ) -> Result<Vec<MetricCorrelation>> {
        let window = TimeRange::around(incident_time, window_minutes);
        let logs = self.logs.query(&LogFilter::new().in_range(window)).await?;
        let mut samples = self.metrics.find_by_query(&window, &MetricFilter::new()).await?;
        samples.sort_by_key(|m| m.timestamp());

        let reach = minutes(i64::from(self.config.related_log_window_minutes));
        let correlations: Vec<MetricCorrelation> = samples
            .into_iter()
            .filter_map(|metric| {
                let at = metric.timestamp();
                let mut related_logs: Vec<LogEntry> = logs
                    .iter()
                    .filter(|e| (e.timestamp - at).abs() <= reach)
                    .cloned()
                    .collect();
                if related_logs.is_empty() {
                    return None;
                }
                related_logs.sort_by_key(|e| e.timestamp);

                let strength = self.strength(&metric, &related_logs);
                Some(MetricCorrelation {
                    metric,
                    related_logs,
                    strength,
                })
            })
            .collect();

        debug!(count = correlations.len(), window_minutes, "correlated metrics");
        Ok(correlations)
    }

    fn strength(&self, metric: &Metric, related_logs: &[LogEntry]) -> CorrelationStrength {
        let value = metric.value.value();
        let counter_spike =
            metric.metric_type() == MetricType::Counter && value > self.config.counter_threshold;

        if counter_spike || related_logs.iter().any(|e| e.level.is_error()) {
            CorrelationStrength::High
        } else if metric.metric_type() == MetricType::Gauge && value > self.config.gauge_threshold {
            CorrelationStrength::Medium
        } else {
            CorrelationStrength::Low
        }
    }

    /// Assemble a full report.
    ///
    /// Without `affected_users`, journeys are traced for the users seen in the
    /// error analysis. Without `affected_workflows`, the summary lists the
    /// workflows of error entries on the timeline.
    pub async fn generate_incident_report(
        &self,
        incident_time: Timestamp,
        description: &str,
        affected_users: Option<&[String]>,
        affected_workflows: Option<&[String]>,
    ) -> Result<IncidentReport> {
        let config = &self.config;
        let (timeline, error_analysis, correlation) = futures::try_join!(
            self.collect_incident_logs(incident_time, config.timeline_window_minutes, None),
            self.analyze_error_pattern(incident_time, config.error_lookback_minutes),
            self.correlate_with_metrics(incident_time, config.correlation_window_minutes),
        )?;

        let users: Vec<String> = match affected_users {
            Some(users) => users.to_vec(),
            None => error_analysis.affected_users.clone(),
        };

        let user_journeys = try_join_all(
            users
                .iter()
                .map(|user| self.trace_user_journey(user, incident_time, config.journey_lookback_minutes)),
        )
        .await?;

        let workflows: Vec<String> = match affected_workflows {
            Some(workflows) => workflows.to_vec(),
            None => {
                let mut seen = HashSet::new();
                timeline
                    .iter()
                    .filter(|e| e.level.is_error())
                    .filter_map(|e| e.workflow_id())
                    .filter(|w| seen.insert(*w))
                    .map(str::to_string)
                    .collect()
            }
        };

        let root_cause_hypotheses = generate_hypotheses(
            &self.rules,
            &Evidence {
                error_analysis: &error_analysis,
                timeline: &timeline,
                correlation: &correlation,
                overload_error_count: config.overload_error_count,
            },
        );
        let recommended_actions = recommended_actions(&root_cause_hypotheses);

        let summary = IncidentSummary {
            incident_time,
            description: description.to_string(),
            window: TimeRange::around(incident_time, config.timeline_window_minutes),
            total_logs: timeline.len(),
            error_count: error_analysis.error_count,
            critical_error_count: error_analysis.critical_errors.len(),
            affected_users: users,
            affected_workflows: workflows,
        };

        info!(
            incident_time = %incident_time.to_rfc3339(),
            logs = summary.total_logs,
            errors = summary.error_count,
            hypotheses = root_cause_hypotheses.len(),
            "incident report generated"
        );

        Ok(IncidentReport {
            summary,
            timeline,
            error_analysis,
            user_journeys,
            correlation,
            root_cause_hypotheses,
            recommended_actions,
        })
    }
}

fn is_critical(entry: &LogEntry) -> bool {
    if entry.level == LogLevel::Fatal {
        return true;
    }
    let message = entry.message.to_lowercase();
    CRITICAL_KEYWORDS.iter().any(|k| message.contains(k))
}
