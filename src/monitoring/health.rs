//! Component health classification.
//!
//! Maps a fixed bundle of component metrics to a discrete status using tiered
//! thresholds, and tracks status changes on a [`SystemHealth`] aggregate.
//!
//! [`SystemHealth::health_summary`] is a separate scorer with its own cut
//! points; it does not agree with the classifier at every input (memory at
//! exactly 75% is Warning by classification but not penalized by the summary).

use crate::core::{now, Error, Result, Timestamp};
use crate::monitoring::events::{CriticalAlert, DomainEvent, EventOutbox, HealthChanged};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// Summary scoring cut points.
const SUMMARY_CPU_LIMIT: f64 = 75.0;
const SUMMARY_MEMORY_LIMIT: f64 = 75.0;
const SUMMARY_ERROR_RATE_LIMIT: f64 = 5.0;
const SUMMARY_RESPONSE_TIME_LIMIT_MS: f64 = 2000.0;

const CPU_PENALTY: u32 = 20;
const MEMORY_PENALTY: u32 = 20;
const ERROR_RATE_PENALTY: u32 = 30;
const RESPONSE_TIME_PENALTY: u32 = 25;

/// Unique health record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthId(pub String);

impl HealthId {
    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HealthId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Down,
}

impl HealthStatus {
    /// Whether the status warrants a critical alert.
    pub fn is_critical(&self) -> bool {
        matches!(self, HealthStatus::Critical | HealthStatus::Down)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

/// Kind of monitored component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentType {
    Service,
    Database,
    Cache,
    Queue,
    Worker,
    External,
    /// Custom type
    Custom(String),
}

/// Metric bundle reported by a component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// CPU usage (%)
    pub cpu: f64,
    /// Memory usage (%)
    pub memory: f64,
    /// Disk usage (%)
    pub disk: f64,
    /// Inbound network (bytes/s)
    pub network_in: f64,
    /// Outbound network (bytes/s)
    pub network_out: f64,
    /// Response time (ms)
    pub response_time: f64,
    /// Error rate (%)
    pub error_rate: f64,
    /// Requests per second
    pub throughput: f64,
}

impl HealthMetrics {
    /// Check that every field is a finite non-negative number and usage
    /// percentages are at most 100.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("cpu", self.cpu),
            ("memory", self.memory),
            ("disk", self.disk),
            ("network_in", self.network_in),
            ("network_out", self.network_out),
            ("response_time", self.response_time),
            ("error_rate", self.error_rate),
            ("throughput", self.throughput),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation(format!(
                    "health metric {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [("cpu", self.cpu), ("memory", self.memory), ("disk", self.disk)] {
            if value > 100.0 {
                return Err(Error::validation(format!(
                    "health metric {} must be at most 100, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Warning and critical cut points for one metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub warning: f64,
    pub critical: f64,
}

impl Tier {
    /// Create a tier.
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Classification thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub cpu: Tier,
    pub memory: Tier,
    pub disk: Tier,
    pub error_rate: Tier,
    /// Response time tier in milliseconds
    pub response_time: Tier,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            cpu: Tier::new(75.0, 90.0),
            memory: Tier::new(75.0, 90.0),
            disk: Tier::new(85.0, 95.0),
            error_rate: Tier::new(5.0, 10.0),
            response_time: Tier::new(2000.0, 5000.0),
        }
    }
}

impl HealthThresholds {
    /// Check that every warning tier sits below its critical tier.
    pub fn validate(&self) -> Result<()> {
        for (name, tier) in self.tiers() {
            if tier.warning >= tier.critical {
                return Err(Error::Config(format!(
                    "{} warning tier {} must be below critical tier {}",
                    name, tier.warning, tier.critical
                )));
            }
        }
        Ok(())
    }

    fn tiers(&self) -> [(&'static str, Tier); 5] {
        [
            ("cpu", self.cpu),
            ("memory", self.memory),
            ("disk", self.disk),
            ("error_rate", self.error_rate),
            ("response_time", self.response_time),
        ]
    }

    fn values(metrics: &HealthMetrics) -> [f64; 5] {
        [
            metrics.cpu,
            metrics.memory,
            metrics.disk,
            metrics.error_rate,
            metrics.response_time,
        ]
    }
}

/// Tiered status classifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthClassifier {
    thresholds: HealthThresholds,
}

impl HealthClassifier {
    /// Create a classifier.
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in use.
    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    /// Classify a metric bundle.
    pub fn classify(&self, metrics: &HealthMetrics) -> HealthStatus {
        let tiers = self.thresholds.tiers();
        let values = HealthThresholds::values(metrics);
        let pairs = || tiers.iter().zip(values.iter());

        if pairs().any(|((_, tier), v)| *v >= tier.critical) {
            HealthStatus::Critical
        } else if pairs().any(|((_, tier), v)| *v >= tier.warning) {
            HealthStatus::Warning
        } else if metrics.response_time == 0.0 && metrics.throughput == 0.0 {
            HealthStatus::Down
        } else {
            HealthStatus::Healthy
        }
    }

    /// Pick the alert type and message for a Critical or Down status.
    pub fn critical_reason(
        &self,
        component: &str,
        status: HealthStatus,
        metrics: &HealthMetrics,
    ) -> (String, String) {
        let t = &self.thresholds;
        let (kind, message) = if status == HealthStatus::Down {
            (
                "availability",
                format!("{} is down: no responses and no throughput", component),
            )
        } else if metrics.cpu >= t.cpu.critical {
            ("cpu", format!("{} CPU usage at {:.1}%", component, metrics.cpu))
        } else if metrics.memory >= t.memory.critical {
            ("memory", format!("{} memory usage at {:.1}%", component, metrics.memory))
        } else if metrics.error_rate >= t.error_rate.critical {
            ("error_rate", format!("{} error rate at {:.1}%", component, metrics.error_rate))
        } else if metrics.response_time >= t.response_time.critical {
            (
                "response_time",
                format!("{} response time at {:.0}ms", component, metrics.response_time),
            )
        } else {
            ("performance", format!("{} performance degraded", component))
        };
        (kind.to_string(), message)
    }
}

/// Scored health overview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// 0..=100
    pub score: u32,
    /// Classified status
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Health record of one component.
///
/// Single-writer aggregate: `update_health` takes `&mut self`.
#[derive(Clone, Debug, Serialize)]
pub struct SystemHealth {
    id: HealthId,
    name: String,
    component_type: ComponentType,
    metrics: HealthMetrics,
    status: HealthStatus,
    previous_status: Option<HealthStatus>,
    last_checked: Timestamp,
    #[serde(skip)]
    classifier: HealthClassifier,
    #[serde(skip)]
    outbox: EventOutbox,
}

impl SystemHealth {
    /// Create a health record with the default thresholds.
    pub fn new(name: &str, component_type: ComponentType, metrics: HealthMetrics) -> Result<Self> {
        Self::with_classifier(name, component_type, metrics, HealthClassifier::default(), now())
    }

    /// Create a health record with explicit classifier and check time.
    ///
    /// The initial classification emits no events.
    pub fn with_classifier(
        name: &str,
        component_type: ComponentType,
        metrics: HealthMetrics,
        classifier: HealthClassifier,
        checked_at: Timestamp,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::validation("component name must not be empty"));
        }
        metrics.validate()?;
        let status = classifier.classify(&metrics);

        Ok(Self {
            id: HealthId::generate(),
            name: name.to_string(),
            component_type,
            metrics,
            status,
            previous_status: None,
            last_checked: checked_at,
            classifier,
            outbox: EventOutbox::new(),
        })
    }

    /// Record new metrics at the current time.
    pub fn update_health(&mut self, metrics: HealthMetrics) -> Result<HealthStatus> {
        self.update_health_at(metrics, now())
    }

    /// Record new metrics at `now`.
    ///
    /// Emits `HealthChanged` only when the status differs from before, and
    /// `CriticalAlert` when that change lands on Critical or Down.
    pub fn update_health_at(&mut self, metrics: HealthMetrics, now: Timestamp) -> Result<HealthStatus> {
        metrics.validate()?;

        let previous = self.status;
        let current = self.classifier.classify(&metrics);
        self.metrics = metrics;
        self.previous_status = Some(previous);
        self.status = current;
        self.last_checked = now;

        if current == previous {
            return Ok(current);
        }

        info!(component = %self.name, %previous, %current, "health status changed");
        self.outbox.push(DomainEvent::HealthChanged(HealthChanged {
            health_id: self.id.clone(),
            component: self.name.clone(),
            previous,
            current,
            occurred_at: now,
        }));

        if current.is_critical() {
            let (alert_type, message) =
                self.classifier.critical_reason(&self.name, current, &self.metrics);
            warn!(component = %self.name, %alert_type, "{}", message);
            self.outbox.push(DomainEvent::CriticalAlert(CriticalAlert {
                health_id: self.id.clone(),
                component: self.name.clone(),
                status: current,
                alert_type,
                message,
                occurred_at: now,
            }));
        }

        Ok(current)
    }

    /// Score the current metrics.
    pub fn health_summary(&self) -> HealthSummary {
        let m = &self.metrics;
        let mut penalty = 0;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if m.cpu > SUMMARY_CPU_LIMIT {
            penalty += CPU_PENALTY;
            issues.push(format!("High CPU usage ({:.1}%)", m.cpu));
            recommendations.push("Scale out or investigate CPU-intensive processes".to_string());
        }
        if m.memory > SUMMARY_MEMORY_LIMIT {
            penalty += MEMORY_PENALTY;
            issues.push(format!("High memory usage ({:.1}%)", m.memory));
            recommendations
                .push("Investigate memory leaks or increase available memory".to_string());
        }
        if m.error_rate > SUMMARY_ERROR_RATE_LIMIT {
            penalty += ERROR_RATE_PENALTY;
            issues.push(format!("Elevated error rate ({:.1}%)", m.error_rate));
            recommendations.push("Review recent error logs and deployments".to_string());
        }
        if m.response_time > SUMMARY_RESPONSE_TIME_LIMIT_MS {
            penalty += RESPONSE_TIME_PENALTY;
            issues.push(format!("Slow response time ({:.0}ms)", m.response_time));
            recommendations
                .push("Profile slow endpoints and check downstream dependencies".to_string());
        }

        HealthSummary {
            score: 100u32.saturating_sub(penalty),
            status: self.status,
            issues,
            recommendations,
        }
    }

    /// Whether the component is Healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Whether the last update changed the status.
    pub fn status_changed(&self) -> bool {
        self.previous_status.is_some_and(|p| p != self.status)
    }

    /// Events waiting to be published.
    pub fn uncommitted_events(&self) -> &[DomainEvent] {
        self.outbox.uncommitted()
    }

    /// Drop pending events after they have been handed off.
    pub fn mark_events_committed(&mut self) {
        self.outbox.mark_committed();
    }

    /// Mutable access to the outbox for draining.
    pub fn outbox_mut(&mut self) -> &mut EventOutbox {
        &mut self.outbox
    }

    /// Record ID.
    pub fn id(&self) -> &HealthId {
        &self.id
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component type.
    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    /// Latest metrics.
    pub fn metrics(&self) -> &HealthMetrics {
        &self.metrics
    }

    /// Current status.
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Status before the last update.
    pub fn previous_status(&self) -> Option<HealthStatus> {
        self.previous_status
    }

    /// Time of the last update.
    pub fn last_checked(&self) -> Timestamp {
        self.last_checked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal() -> HealthMetrics {
        HealthMetrics {
            cpu: 20.0,
            memory: 40.0,
            disk: 50.0,
            network_in: 1000.0,
            network_out: 800.0,
            response_time: 150.0,
            error_rate: 0.5,
            throughput: 120.0,
        }
    }

    fn component(metrics: HealthMetrics) -> SystemHealth {
        SystemHealth::new("api-gateway", ComponentType::Service, metrics).unwrap()
    }

    #[test]
    fn test_classification_examples() {
        let classifier = HealthClassifier::default();

        let critical = HealthMetrics { cpu: 95.0, ..nominal() };
        assert_eq!(classifier.classify(&critical), HealthStatus::Critical);

        let warning = HealthMetrics {
            cpu: 80.0,
            memory: 50.0,
            error_rate: 0.0,
            response_time: 500.0,
            ..nominal()
        };
        assert_eq!(classifier.classify(&warning), HealthStatus::Warning);

        let down = HealthMetrics {
            response_time: 0.0,
            throughput: 0.0,
            ..nominal()
        };
        assert_eq!(classifier.classify(&down), HealthStatus::Down);

        let healthy = HealthMetrics {
            response_time: 1.0,
            throughput: 0.0,
            ..nominal()
        };
        assert_eq!(classifier.classify(&healthy), HealthStatus::Healthy);
    }

    #[test]
    fn test_tiers_are_inclusive() {
        let classifier = HealthClassifier::default();
        let at_disk_critical = HealthMetrics { disk: 95.0, ..nominal() };
        assert_eq!(classifier.classify(&at_disk_critical), HealthStatus::Critical);

        let at_error_warning = HealthMetrics { error_rate: 5.0, ..nominal() };
        assert_eq!(classifier.classify(&at_error_warning), HealthStatus::Warning);

        let at_latency_critical = HealthMetrics { response_time: 5000.0, ..nominal() };
        assert_eq!(classifier.classify(&at_latency_critical), HealthStatus::Critical);
    }

    #[test]
    fn test_critical_outranks_down() {
        let classifier = HealthClassifier::default();
        let metrics = HealthMetrics {
            cpu: 99.0,
            response_time: 0.0,
            throughput: 0.0,
            ..nominal()
        };
        assert_eq!(classifier.classify(&metrics), HealthStatus::Critical);
    }

    #[test]
    fn test_initial_pass_emits_nothing() {
        let health = component(HealthMetrics { cpu: 95.0, ..nominal() });
        assert_eq!(health.status(), HealthStatus::Critical);
        assert!(health.previous_status().is_none());
        assert!(health.uncommitted_events().is_empty());
    }

    #[test]
    fn test_update_is_idempotent_for_same_input() {
        let mut health = component(nominal());
        let degraded = HealthMetrics { cpu: 80.0, ..nominal() };

        health.update_health(degraded.clone()).unwrap();
        health.update_health(degraded).unwrap();

        let changes = health
            .uncommitted_events()
            .iter()
            .filter(|e| matches!(e, DomainEvent::HealthChanged(_)))
            .count();
        assert_eq!(changes, 1);
        assert_eq!(health.previous_status(), Some(HealthStatus::Warning));
        assert!(!health.status_changed());
    }

    #[test]
    fn test_critical_alert_precedence() {
        let cases = [
            (
                HealthMetrics { response_time: 0.0, throughput: 0.0, ..nominal() },
                "availability",
            ),
            (HealthMetrics { cpu: 92.0, memory: 95.0, ..nominal() }, "cpu"),
            (HealthMetrics { memory: 95.0, error_rate: 20.0, ..nominal() }, "memory"),
            (HealthMetrics { error_rate: 12.0, response_time: 9000.0, ..nominal() }, "error_rate"),
            (HealthMetrics { response_time: 6000.0, ..nominal() }, "response_time"),
            (HealthMetrics { disk: 97.0, ..nominal() }, "performance"),
        ];

        for (metrics, expected) in cases {
            let mut health = component(nominal());
            health.update_health(metrics).unwrap();
            let alert = health.uncommitted_events().iter().find_map(|e| match e {
                DomainEvent::CriticalAlert(a) => Some(a.clone()),
                _ => None,
            });
            let alert = alert.unwrap_or_else(|| panic!("no critical alert for {}", expected));
            assert_eq!(alert.alert_type, expected);
        }
    }

    #[test]
    fn test_generic_message() {
        let mut health = component(nominal());
        health
            .update_health(HealthMetrics { disk: 97.0, ..nominal() })
            .unwrap();
        match health.uncommitted_events().last() {
            Some(DomainEvent::CriticalAlert(a)) => {
                assert_eq!(a.message, "api-gateway performance degraded")
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_warning_change_emits_no_critical_alert() {
        let mut health = component(nominal());
        health
            .update_health(HealthMetrics { memory: 80.0, ..nominal() })
            .unwrap();
        assert_eq!(health.uncommitted_events().len(), 1);
        assert!(health.status_changed());
    }

    #[test]
    fn test_invalid_metrics_rejected_without_mutation() {
        let mut health = component(nominal());
        let bad = HealthMetrics { cpu: -1.0, ..nominal() };
        assert!(health.update_health(bad).is_err());
        assert!(health
            .update_health(HealthMetrics { memory: 120.0, ..nominal() })
            .is_err());
        assert_eq!(health.metrics(), &nominal());
        assert!(SystemHealth::new("", ComponentType::Cache, nominal()).is_err());
    }

    #[test]
    fn test_summary_scoring() {
        let health = component(nominal());
        let summary = health.health_summary();
        assert_eq!(summary.score, 100);
        assert!(summary.issues.is_empty());

        let health = component(HealthMetrics {
            cpu: 80.0,
            memory: 80.0,
            error_rate: 6.0,
            response_time: 2500.0,
            ..nominal()
        });
        let summary = health.health_summary();
        assert_eq!(summary.score, 5);
        assert_eq!(summary.issues.len(), 4);
        assert_eq!(summary.recommendations.len(), 4);
    }

    #[test]
    fn test_summary_ignores_classifier_thresholds() {
        let relaxed = HealthThresholds {
            cpu: Tier::new(95.0, 99.0),
            ..HealthThresholds::default()
        };
        let health = SystemHealth::with_classifier(
            "db",
            ComponentType::Database,
            HealthMetrics { cpu: 80.0, ..nominal() },
            HealthClassifier::new(relaxed),
            now(),
        )
        .unwrap();
        assert_eq!(health.status(), HealthStatus::Healthy);
        assert_eq!(health.health_summary().score, 80);
    }

    #[test]
    fn test_summary_and_classifier_disagree() {
        let health = component(HealthMetrics { memory: 74.0, cpu: 76.0, ..nominal() });
        // cpu 76 is Warning for the classifier and penalized by the summary;
        // memory 74 is below both.
        assert_eq!(health.status(), HealthStatus::Warning);
        assert_eq!(health.health_summary().score, 80);

        let health = component(HealthMetrics { memory: 75.0, ..nominal() });
        // 75 is the classifier's warning tier but not above the summary limit.
        assert_eq!(health.status(), HealthStatus::Warning);
        assert_eq!(health.health_summary().score, 100);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(HealthThresholds::default().validate().is_ok());
        let mut bad = HealthThresholds::default();
        bad.cpu = Tier::new(90.0, 80.0);
        assert!(bad.validate().is_err());
    }
}
