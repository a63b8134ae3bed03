//! Alerting system for monitoring.
//!
//! An [`Alert`] couples a [`Threshold`] with cooldown and hourly rate
//! limiting, and records lifecycle changes as outbox events.
//!
//! Lifecycle:
//!
//! ```text
//! Active --crossed--> Triggered --cleared (auto_resolve)--> Resolved
//!                     Triggered --resolve()--------------> Resolved
//! any --suppress()--> Suppressed      any --disable()--> Disabled
//! Disabled --enable()--> Active
//! ```
//!
//! The hourly cap uses a truncating window: the counter resets only once more
//! than 60 minutes have passed since the last reset, so a burst straddling
//! the reset can exceed the cap.

use crate::core::{minutes, now, Error, Result, Timestamp};
use crate::monitoring::events::{AlertResolved, AlertTriggered, DomainEvent, EventOutbox};
use crate::monitoring::metrics::{Metric, MetricValue};
use crate::monitoring::threshold::{Threshold, ThresholdDefinition};
use crate::store::EventPublisher;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

const HOUR_WINDOW_MINUTES: i64 = 60;

/// Unique alert identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    /// Create an alert ID from a string.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Watching, not firing
    Active,
    /// Threshold crossed
    Triggered,
    /// Cleared after triggering
    Resolved,
    /// Silenced by an operator
    Suppressed,
    /// Switched off
    Disabled,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Triggered => write!(f, "triggered"),
            AlertStatus::Resolved => write!(f, "resolved"),
            AlertStatus::Suppressed => write!(f, "suppressed"),
            AlertStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Notification channel for alerts.
///
/// Delivery is handled outside this crate; channels travel on the
/// `AlertTriggered` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Email notification
    Email { to: Vec<String> },
    /// Slack notification
    Slack { webhook_url: String, channel: String },
    /// Webhook
    Webhook { url: String },
    /// In-app notification
    InApp,
    /// SMS
    Sms { numbers: Vec<String> },
}

/// Alert rate limiting and resolution settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertConfiguration {
    /// Where notifications go
    pub channels: Vec<NotificationChannel>,
    /// Minimum minutes between triggers
    pub cooldown_minutes: i64,
    /// Trigger cap per hour window
    pub max_triggers_per_hour: u32,
    /// Resolve automatically once the condition clears
    pub auto_resolve: bool,
    /// Resolve automatically this long after the last trigger
    pub auto_resolve_after_minutes: Option<u32>,
}

impl Default for AlertConfiguration {
    fn default() -> Self {
        Self {
            channels: vec![NotificationChannel::InApp],
            cooldown_minutes: 15,
            max_triggers_per_hour: 4,
            auto_resolve: true,
            auto_resolve_after_minutes: None,
        }
    }
}

impl AlertConfiguration {
    /// Set cooldown.
    pub fn with_cooldown(mut self, cooldown_minutes: i64) -> Self {
        self.cooldown_minutes = cooldown_minutes;
        self
    }

    /// Set hourly cap.
    pub fn with_max_triggers_per_hour(mut self, max: u32) -> Self {
        self.max_triggers_per_hour = max;
        self
    }

    /// Set auto resolve.
    pub fn with_auto_resolve(mut self, auto_resolve: bool) -> Self {
        self.auto_resolve = auto_resolve;
        self
    }

    /// Resolve a fixed time after triggering.
    pub fn with_auto_resolve_after(mut self, minutes: u32) -> Self {
        self.auto_resolve_after_minutes = Some(minutes);
        self
    }

    /// Add a channel.
    pub fn with_channel(mut self, channel: NotificationChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Check the numeric bounds.
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_minutes < 0 {
            return Err(Error::validation(format!(
                "cooldown must be non-negative, got {}",
                self.cooldown_minutes
            )));
        }
        if Duration::try_minutes(self.cooldown_minutes).is_none() {
            return Err(Error::validation(format!(
                "cooldown of {} minutes is out of range",
                self.cooldown_minutes
            )));
        }
        if self.max_triggers_per_hour < 1 {
            return Err(Error::validation("max triggers per hour must be at least 1"));
        }
        Ok(())
    }
}

/// A threshold alert with its own lifecycle.
///
/// Not safe for concurrent evaluation: every mutating method takes
/// `&mut self`, callers sharing an alert must serialize access.
#[derive(Clone, Debug, Serialize)]
pub struct Alert {
    id: AlertId,
    name: String,
    metric_name: String,
    threshold: Threshold,
    configuration: AlertConfiguration,
    status: AlertStatus,
    last_triggered: Option<Timestamp>,
    trigger_count: u64,
    triggers_this_hour: u32,
    last_hour_reset: Timestamp,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(skip)]
    outbox: EventOutbox,
}

impl Alert {
    /// Create a new alert in the Active state.
    pub fn new(
        name: &str,
        metric_name: &str,
        threshold: Threshold,
        configuration: AlertConfiguration,
    ) -> Result<Self> {
        Self::new_at(name, metric_name, threshold, configuration, now())
    }

    /// Create a new alert with an explicit creation time.
    pub fn new_at(
        name: &str,
        metric_name: &str,
        threshold: Threshold,
        configuration: AlertConfiguration,
        created_at: Timestamp,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::validation("alert name must not be empty"));
        }
        if metric_name.trim().is_empty() {
            return Err(Error::validation("alert metric name must not be empty"));
        }
        configuration.validate()?;

        Ok(Self {
            id: AlertId::generate(),
            name: name.to_string(),
            metric_name: metric_name.to_string(),
            threshold,
            configuration,
            status: AlertStatus::Active,
            last_triggered: None,
            trigger_count: 0,
            triggers_this_hour: 0,
            last_hour_reset: created_at,
            created_at,
            updated_at: created_at,
            outbox: EventOutbox::new(),
        })
    }

    /// Evaluate a sample at the current time.
    pub fn evaluate(&mut self, value: &MetricValue) -> bool {
        self.evaluate_at(value, now())
    }

    /// Evaluate a sample at `now`.
    ///
    /// Returns `true` only when this call triggered the alert.
    pub fn evaluate_at(&mut self, value: &MetricValue, now: Timestamp) -> bool {
        if !matches!(self.status, AlertStatus::Active | AlertStatus::Triggered) {
            return false;
        }

        if self.is_in_cooldown_at(now) {
            debug!(alert = %self.name, "evaluation skipped, in cooldown");
            return false;
        }

        if now - self.last_hour_reset > minutes(HOUR_WINDOW_MINUTES) {
            self.triggers_this_hour = 0;
            self.last_hour_reset = now;
        }

        if !self.threshold.evaluate(value.value()) {
            if self.status == AlertStatus::Triggered && self.configuration.auto_resolve {
                self.mark_resolved(now, true);
            }
            return false;
        }

        // The cap only gates new triggers; resolution above is never rate limited.
        if self.triggers_this_hour >= self.configuration.max_triggers_per_hour {
            debug!(
                alert = %self.name,
                triggers_this_hour = self.triggers_this_hour,
                "evaluation skipped, hourly cap reached"
            );
            return false;
        }

        self.status = AlertStatus::Triggered;
        self.trigger_count += 1;
        self.triggers_this_hour += 1;
        self.last_triggered = Some(now);
        self.updated_at = now;

        info!(
            alert = %self.name,
            metric = %self.metric_name,
            value = value.value(),
            condition = %self.threshold,
            "alert triggered"
        );

        self.outbox.push(DomainEvent::AlertTriggered(AlertTriggered {
            alert_id: self.id.clone(),
            alert_name: self.name.clone(),
            metric_name: self.metric_name.clone(),
            value: value.value(),
            condition: self.threshold.describe(),
            severity: self.threshold.severity(),
            channels: self.configuration.channels.clone(),
            trigger_count: self.trigger_count,
            occurred_at: now,
        }));

        true
    }

    /// Manually resolve a triggered alert. No-op in any other state.
    pub fn resolve(&mut self) {
        self.resolve_at(now());
    }

    /// Manually resolve at `now`.
    pub fn resolve_at(&mut self, now: Timestamp) {
        if self.status == AlertStatus::Triggered {
            self.mark_resolved(now, false);
        }
    }

    /// Resolve once `auto_resolve_after_minutes` have passed since the last trigger.
    ///
    /// Returns whether the alert was resolved by this call.
    pub fn check_auto_resolve_at(&mut self, now: Timestamp) -> bool {
        if self.status != AlertStatus::Triggered || !self.configuration.auto_resolve {
            return false;
        }
        let (Some(after), Some(last)) =
            (self.configuration.auto_resolve_after_minutes, self.last_triggered)
        else {
            return false;
        };

        if now - last >= minutes(after as i64) {
            self.mark_resolved(now, true);
            true
        } else {
            false
        }
    }

    /// Silence the alert.
    pub fn suppress(&mut self) {
        self.suppress_at(now());
    }

    /// Silence the alert at `now`.
    pub fn suppress_at(&mut self, now: Timestamp) {
        self.status = AlertStatus::Suppressed;
        self.updated_at = now;
        info!(alert = %self.name, "alert suppressed");
    }

    /// Switch the alert off.
    pub fn disable(&mut self) {
        self.disable_at(now());
    }

    /// Switch the alert off at `now`.
    pub fn disable_at(&mut self, now: Timestamp) {
        self.status = AlertStatus::Disabled;
        self.updated_at = now;
        info!(alert = %self.name, "alert disabled");
    }

    /// Re-enable a disabled alert. No-op in any other state.
    pub fn enable(&mut self) {
        self.enable_at(now());
    }

    /// Re-enable at `now`.
    pub fn enable_at(&mut self, now: Timestamp) {
        if self.status == AlertStatus::Disabled {
            self.status = AlertStatus::Active;
            self.updated_at = now;
            info!(alert = %self.name, "alert enabled");
        }
    }

    /// Replace the threshold.
    pub fn update_threshold(&mut self, threshold: Threshold) {
        self.update_threshold_at(threshold, now());
    }

    /// Replace the threshold at `now`.
    pub fn update_threshold_at(&mut self, threshold: Threshold, now: Timestamp) {
        self.threshold = threshold;
        self.updated_at = now;
    }

    /// Replace the configuration. Fails without changes if invalid.
    pub fn update_configuration(&mut self, configuration: AlertConfiguration) -> Result<()> {
        self.update_configuration_at(configuration, now())
    }

    /// Replace the configuration at `now`.
    pub fn update_configuration_at(
        &mut self,
        configuration: AlertConfiguration,
        now: Timestamp,
    ) -> Result<()> {
        configuration.validate()?;
        self.configuration = configuration;
        self.updated_at = now;
        Ok(())
    }

    /// Whether a trigger at `now` would be blocked by the cooldown.
    pub fn is_in_cooldown_at(&self, now: Timestamp) -> bool {
        match self.last_triggered {
            Some(last) => match Duration::try_minutes(self.configuration.cooldown_minutes) {
                Some(cooldown) => now - last < cooldown,
                None => true,
            },
            None => false,
        }
    }

    fn mark_resolved(&mut self, now: Timestamp, auto_resolved: bool) {
        self.status = AlertStatus::Resolved;
        self.updated_at = now;
        info!(alert = %self.name, auto_resolved, "alert resolved");
        self.outbox.push(DomainEvent::AlertResolved(AlertResolved {
            alert_id: self.id.clone(),
            alert_name: self.name.clone(),
            auto_resolved,
            occurred_at: now,
        }));
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

    /// Alert ID.
    pub fn id(&self) -> &AlertId {
        &self.id
    }

    /// Alert name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Watched metric.
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Threshold.
    pub fn threshold(&self) -> &Threshold {
        &self.threshold
    }

    /// Configuration.
    pub fn configuration(&self) -> &AlertConfiguration {
        &self.configuration
    }

    /// Current status.
    pub fn status(&self) -> AlertStatus {
        self.status
    }

    /// Time of the last trigger.
    pub fn last_triggered(&self) -> Option<Timestamp> {
        self.last_triggered
    }

    /// Total triggers.
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    /// Triggers in the current hour window.
    pub fn triggers_this_hour(&self) -> u32 {
        self.triggers_this_hour
    }

    /// Start of the current hour window.
    pub fn last_hour_reset(&self) -> Timestamp {
        self.last_hour_reset
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last modification time.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Check if triggered.
    pub fn is_triggered(&self) -> bool {
        self.status == AlertStatus::Triggered
    }
}

/// Serializable alert definition.
///
/// ```json
/// {"name": "high_cpu", "metricName": "cpu_usage",
///  "threshold": {"operator": "GT", "value": 80},
///  "cooldownMinutes": 5, "maxTriggersPerHour": 3, "autoResolve": true}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    /// Alert name
    pub name: String,
    /// Metric to watch
    pub metric_name: String,
    /// Condition
    pub threshold: ThresholdDefinition,
    /// Rate limiting and resolution settings
    #[serde(flatten)]
    pub configuration: AlertConfiguration,
}

impl AlertDefinition {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the alert.
    pub fn build(&self) -> Result<Alert> {
        Alert::new(
            &self.name,
            &self.metric_name,
            self.threshold.build()?,
            self.configuration.clone(),
        )
    }
}

/// Registry of alerts keyed by ID.
pub struct AlertManager {
    /// Registered alerts
    alerts: HashMap<AlertId, Alert>,
}

impl AlertManager {
    /// Create a new alert manager.
    pub fn new() -> Self {
        Self {
            alerts: HashMap::new(),
        }
    }

    /// Register an alert.
    pub fn register(&mut self, alert: Alert) -> AlertId {
        let id = alert.id().clone();
        self.alerts.insert(id.clone(), alert);
        id
    }

    /// Remove an alert.
    pub fn remove(&mut self, id: &AlertId) -> Result<Alert> {
        self.alerts
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("alert {}", id)))
    }

    /// Get alert by ID.
    pub fn get(&self, id: &AlertId) -> Option<&Alert> {
        self.alerts.get(id)
    }

    /// Get mutable alert by ID.
    pub fn get_mut(&mut self, id: &AlertId) -> Result<&mut Alert> {
        self.alerts
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("alert {}", id)))
    }

    /// Alerts watching a metric.
    pub fn alerts_for_metric(&self, metric_name: &str) -> Vec<&Alert> {
        self.alerts
            .values()
            .filter(|a| a.metric_name() == metric_name)
            .collect()
    }

    /// Currently triggered alerts.
    pub fn triggered_alerts(&self) -> Vec<&Alert> {
        self.alerts.values().filter(|a| a.is_triggered()).collect()
    }

    /// Evaluate a metric sample at the current time.
    pub fn evaluate_metric(&mut self, metric: &Metric) -> Vec<AlertId> {
        self.evaluate_metric_at(&metric.name, &metric.value, now())
    }

    /// Evaluate a value against every alert watching `metric_name`.
    ///
    /// Returns IDs of alerts triggered by this call.
    pub fn evaluate_metric_at(
        &mut self,
        metric_name: &str,
        value: &MetricValue,
        now: Timestamp,
    ) -> Vec<AlertId> {
        self.alerts
            .values_mut()
            .filter(|a| a.metric_name() == metric_name)
            .filter_map(|a| a.evaluate_at(value, now).then(|| a.id().clone()))
            .collect()
    }

    /// Apply time-based auto resolution to every alert.
    pub fn check_auto_resolve_at(&mut self, now: Timestamp) -> Vec<AlertId> {
        self.alerts
            .values_mut()
            .filter_map(|a| a.check_auto_resolve_at(now).then(|| a.id().clone()))
            .collect()
    }

    /// Total events waiting across all alerts.
    pub fn pending_event_count(&self) -> usize {
        self.alerts.values().map(|a| a.uncommitted_events().len()).sum()
    }

    /// Drain every alert's outbox to a publisher.
    ///
    /// Stops at the first failure; unpublished events stay pending.
    pub async fn publish_pending(&mut self, publisher: &dyn EventPublisher) -> Result<usize> {
        let mut published = 0;
        for alert in self.alerts.values_mut() {
            published += alert.outbox_mut().publish_to(publisher).await?;
        }
        Ok(published)
    }

    /// Number of registered alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::threshold::Severity;
    use crate::store::RecordingPublisher;
    use chrono::TimeZone;

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn gauge(v: f64) -> MetricValue {
        MetricValue::gauge(v, "%").unwrap()
    }

    fn cpu_alert(config: AlertConfiguration) -> Alert {
        Alert::new_at("high_cpu", "cpu_usage", Threshold::greater_than(80.0).unwrap(), config, t0())
            .unwrap()
    }

    #[test]
    fn test_construction_validation() {
        let t = Threshold::greater_than(1.0).unwrap();
        let ok = AlertConfiguration::default();
        assert!(Alert::new("", "m", t.clone(), ok.clone()).unwrap_err().is_validation());
        assert!(Alert::new("a", " ", t.clone(), ok.clone()).is_err());
        assert!(Alert::new("a", "m", t.clone(), ok.clone().with_cooldown(-1)).is_err());
        assert!(Alert::new("a", "m", t.clone(), ok.clone().with_max_triggers_per_hour(0)).is_err());

        let alert = Alert::new("a", "m", t, ok).unwrap();
        assert_eq!(alert.status(), AlertStatus::Active);
        assert_eq!(alert.trigger_count(), 0);
    }

    #[test]
    fn test_trigger_enqueues_event() {
        let mut alert = cpu_alert(AlertConfiguration::default());
        assert!(alert.evaluate_at(&gauge(85.0), t0()));
        assert_eq!(alert.status(), AlertStatus::Triggered);
        assert_eq!(alert.trigger_count(), 1);
        assert_eq!(alert.last_triggered(), Some(t0()));

        match &alert.uncommitted_events()[0] {
            DomainEvent::AlertTriggered(e) => {
                assert_eq!(e.value, 85.0);
                assert_eq!(e.condition, "greater than 80");
                assert_eq!(e.severity, Severity::Warning);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_below_threshold_stays_active() {
        let mut alert = cpu_alert(AlertConfiguration::default());
        assert!(!alert.evaluate_at(&gauge(40.0), t0()));
        assert_eq!(alert.status(), AlertStatus::Active);
        assert!(alert.uncommitted_events().is_empty());
    }

    #[test]
    fn test_cooldown_blocks_for_full_window() {
        let config = AlertConfiguration::default()
            .with_cooldown(15)
            .with_max_triggers_per_hour(100)
            .with_auto_resolve(false);
        let mut alert = cpu_alert(config);
        assert!(alert.evaluate_at(&gauge(95.0), t0()));

        for minute in 0..15 {
            let at = t0() + minutes(minute) + chrono::Duration::seconds(30);
            assert!(!alert.evaluate_at(&gauge(99.0), at), "minute {}", minute);
            assert!(!alert.evaluate_at(&gauge(10.0), at));
        }
        assert_eq!(alert.trigger_count(), 1);

        assert!(alert.evaluate_at(&gauge(99.0), t0() + minutes(15)));
        assert_eq!(alert.trigger_count(), 2);
    }

    #[test]
    fn test_clearing_value_during_cooldown_keeps_triggered() {
        let config = AlertConfiguration::default()
            .with_cooldown(15)
            .with_auto_resolve(true);
        let mut alert = cpu_alert(config);
        assert!(alert.evaluate_at(&gauge(95.0), t0()));

        assert!(!alert.evaluate_at(&gauge(10.0), t0() + minutes(5)));
        assert_eq!(alert.status(), AlertStatus::Triggered);
        assert!(!alert
            .uncommitted_events()
            .iter()
            .any(|e| matches!(e, DomainEvent::AlertResolved(_))));

        assert!(!alert.evaluate_at(&gauge(10.0), t0() + minutes(15)));
        assert_eq!(alert.status(), AlertStatus::Resolved);
        match alert.uncommitted_events().last() {
            Some(DomainEvent::AlertResolved(e)) => assert!(e.auto_resolved),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_cooldown_rejected() {
        let huge = AlertConfiguration::default().with_cooldown(200_000_000_000_000);
        assert!(huge.validate().unwrap_err().is_validation());

        let json = r#"{
            "name": "cpu",
            "metricName": "cpu_usage",
            "threshold": {"operator": "GT", "value": 1},
            "cooldownMinutes": 200000000000000
        }"#;
        let def = AlertDefinition::from_json(json).unwrap();
        assert!(def.build().is_err());

        let mut alert = cpu_alert(AlertConfiguration::default());
        assert!(alert.update_configuration(huge).is_err());
        assert_eq!(alert.configuration().cooldown_minutes, 15);
    }

    #[test]
    fn test_largest_valid_cooldown_does_not_overflow() {
        let longest = i64::MAX / 60_000;
        let config = AlertConfiguration::default().with_cooldown(longest);
        assert!(config.validate().is_ok());

        let mut alert = cpu_alert(config);
        assert!(alert.evaluate_at(&gauge(95.0), t0()));
        assert!(alert.is_in_cooldown_at(t0() + minutes(60 * 24 * 365)));
        assert!(!alert.evaluate_at(&gauge(95.0), t0() + minutes(60)));
    }

    #[test]
    fn test_lifecycle_changes_use_given_clock() {
        let mut alert = cpu_alert(AlertConfiguration::default());

        alert.suppress_at(t0() + minutes(1));
        assert_eq!(alert.status(), AlertStatus::Suppressed);
        assert_eq!(alert.updated_at(), t0() + minutes(1));

        alert.disable_at(t0() + minutes(2));
        assert_eq!(alert.updated_at(), t0() + minutes(2));

        alert.enable_at(t0() + minutes(3));
        assert_eq!(alert.status(), AlertStatus::Active);
        assert_eq!(alert.updated_at(), t0() + minutes(3));

        alert.enable_at(t0() + minutes(4));
        assert_eq!(alert.updated_at(), t0() + minutes(3));

        alert.update_threshold_at(Threshold::less_than(5.0).unwrap(), t0() + minutes(5));
        assert_eq!(alert.updated_at(), t0() + minutes(5));

        let config = AlertConfiguration::default().with_cooldown(1);
        alert.update_configuration_at(config, t0() + minutes(6)).unwrap();
        assert_eq!(alert.updated_at(), t0() + minutes(6));
        assert_eq!(alert.configuration().cooldown_minutes, 1);
    }

    #[test]
    fn test_hourly_cap() {
        let config = AlertConfiguration::default()
            .with_cooldown(0)
            .with_max_triggers_per_hour(4);
        let mut alert = cpu_alert(config);

        for i in 0..4 {
            assert!(alert.evaluate_at(&gauge(90.0), t0() + minutes(i)));
        }
        assert_eq!(alert.uncommitted_events().len(), 4);

        assert!(!alert.evaluate_at(&gauge(90.0), t0() + minutes(10)));
        assert_eq!(alert.uncommitted_events().len(), 4);
        assert_eq!(alert.triggers_this_hour(), 4);
    }

    #[test]
    fn test_hour_window_truncates() {
        let config = AlertConfiguration::default()
            .with_cooldown(0)
            .with_max_triggers_per_hour(1)
            .with_auto_resolve(false);
        let mut alert = cpu_alert(config);

        assert!(alert.evaluate_at(&gauge(90.0), t0() + minutes(59)));
        // Exactly 60 minutes after the reset is still the same window.
        assert!(!alert.evaluate_at(&gauge(90.0), t0() + minutes(60)));
        // Just past it the counter resets, even though the last trigger was two minutes ago.
        assert!(alert.evaluate_at(&gauge(90.0), t0() + minutes(61)));
        assert_eq!(alert.last_hour_reset(), t0() + minutes(61));
    }

    #[test]
    fn test_inactive_states_never_evaluate() {
        let mut suppressed = cpu_alert(AlertConfiguration::default());
        suppressed.suppress();
        let mut disabled = cpu_alert(AlertConfiguration::default());
        disabled.disable();
        let mut resolved = cpu_alert(AlertConfiguration::default());
        resolved.evaluate_at(&gauge(90.0), t0());
        resolved.resolve_at(t0());
        resolved.mark_events_committed();

        for alert in [&mut suppressed, &mut disabled, &mut resolved] {
            let count = alert.trigger_count();
            let hour = alert.triggers_this_hour();
            let reset = alert.last_hour_reset();
            assert!(!alert.evaluate_at(&gauge(99.0), t0() + minutes(120)));
            assert_eq!(alert.trigger_count(), count);
            assert_eq!(alert.triggers_this_hour(), hour);
            assert_eq!(alert.last_hour_reset(), reset);
            assert!(alert.uncommitted_events().is_empty());
        }
    }

    #[test]
    fn test_manual_resolve_and_noops() {
        let mut alert = cpu_alert(AlertConfiguration::default());
        alert.resolve_at(t0());
        assert_eq!(alert.status(), AlertStatus::Active);
        assert!(alert.uncommitted_events().is_empty());

        alert.evaluate_at(&gauge(90.0), t0());
        alert.resolve_at(t0() + minutes(1));
        assert_eq!(alert.status(), AlertStatus::Resolved);
        match alert.uncommitted_events().last() {
            Some(DomainEvent::AlertResolved(e)) => assert!(!e.auto_resolved),
            other => panic!("unexpected event {:?}", other),
        }

        alert.enable();
        assert_eq!(alert.status(), AlertStatus::Resolved);
    }

    #[test]
    fn test_disable_enable() {
        let mut alert = cpu_alert(AlertConfiguration::default());
        alert.disable();
        assert_eq!(alert.status(), AlertStatus::Disabled);
        alert.enable();
        assert_eq!(alert.status(), AlertStatus::Active);

        alert.suppress();
        alert.disable();
        assert_eq!(alert.status(), AlertStatus::Disabled);
    }

    #[test]
    fn test_end_to_end_cap_then_auto_resolve() {
        let config = AlertConfiguration::default()
            .with_cooldown(0)
            .with_max_triggers_per_hour(1)
            .with_auto_resolve(true);
        let mut alert = cpu_alert(config);

        assert!(alert.evaluate_at(&gauge(85.0), t0()));
        assert_eq!(alert.status(), AlertStatus::Triggered);
        assert_eq!(alert.trigger_count(), 1);

        assert!(!alert.evaluate_at(&gauge(90.0), t0() + minutes(5)));
        assert_eq!(alert.status(), AlertStatus::Triggered);
        assert_eq!(alert.trigger_count(), 1);

        assert!(!alert.evaluate_at(&gauge(50.0), t0() + minutes(10)));
        assert_eq!(alert.status(), AlertStatus::Resolved);
        match alert.uncommitted_events().last() {
            Some(DomainEvent::AlertResolved(e)) => assert!(e.auto_resolved),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_no_auto_resolve_keeps_triggered() {
        let config = AlertConfiguration::default()
            .with_cooldown(0)
            .with_auto_resolve(false);
        let mut alert = cpu_alert(config);
        alert.evaluate_at(&gauge(85.0), t0());
        assert!(!alert.evaluate_at(&gauge(20.0), t0() + minutes(1)));
        assert_eq!(alert.status(), AlertStatus::Triggered);
    }

    #[test]
    fn test_timed_auto_resolve() {
        let config = AlertConfiguration::default().with_auto_resolve_after(30);
        let mut alert = cpu_alert(config);
        alert.evaluate_at(&gauge(85.0), t0());

        assert!(!alert.check_auto_resolve_at(t0() + minutes(29)));
        assert!(alert.check_auto_resolve_at(t0() + minutes(30)));
        assert_eq!(alert.status(), AlertStatus::Resolved);
        assert!(!alert.check_auto_resolve_at(t0() + minutes(31)));
    }

    #[test]
    fn test_update_configuration_validates() {
        let mut alert = cpu_alert(AlertConfiguration::default());
        let bad = AlertConfiguration::default().with_max_triggers_per_hour(0);
        assert!(alert.update_configuration(bad).is_err());
        assert_eq!(alert.configuration().max_triggers_per_hour, 4);

        alert.update_threshold(Threshold::less_than(5.0).unwrap());
        assert!(alert.evaluate_at(&gauge(1.0), t0()));
    }

    #[test]
    fn test_definition_from_json() {
        let def = AlertDefinition::from_json(
            r##"{
                "name": "latency",
                "metricName": "http_latency",
                "threshold": {"operator": "GTE", "value": 500, "severity": "Critical"},
                "channels": [{"kind": "slack", "webhook_url": "https://hooks", "channel": "#ops"}],
                "cooldownMinutes": 5,
                "maxTriggersPerHour": 2,
                "autoResolve": false
            }"##,
        )
        .unwrap();
        let alert = def.build().unwrap();
        assert_eq!(alert.metric_name(), "http_latency");
        assert_eq!(alert.configuration().cooldown_minutes, 5);
        assert_eq!(alert.threshold().severity(), Severity::Critical);
        assert_eq!(alert.configuration().channels.len(), 1);

        let invalid = AlertDefinition::from_json(
            r#"{"name":"x","metricName":"y","threshold":{"operator":"GT","value":1},"cooldownMinutes":-3}"#,
        )
        .unwrap();
        assert!(invalid.build().is_err());
    }

    #[test]
    fn test_manager_routes_by_metric() {
        let mut manager = AlertManager::new();
        let cpu = manager.register(cpu_alert(AlertConfiguration::default()));
        let mem = manager.register(
            Alert::new_at(
                "high_mem",
                "memory_usage",
                Threshold::greater_than(90.0).unwrap(),
                AlertConfiguration::default(),
                t0(),
            )
            .unwrap(),
        );

        let triggered = manager.evaluate_metric_at("cpu_usage", &gauge(95.0), t0());
        assert_eq!(triggered, vec![cpu.clone()]);
        assert_eq!(manager.triggered_alerts().len(), 1);
        assert_eq!(manager.get(&mem).map(|a| a.status()), Some(AlertStatus::Active));

        assert!(manager.get_mut(&AlertId::new("missing")).is_err());
        assert!(manager.remove(&mem).is_ok());
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_manager_publishes_pending() {
        let mut manager = AlertManager::new();
        manager.register(cpu_alert(AlertConfiguration::default()));
        manager.evaluate_metric_at("cpu_usage", &gauge(95.0), t0());
        assert_eq!(manager.pending_event_count(), 1);

        let publisher = RecordingPublisher::new();
        assert_eq!(manager.publish_pending(&publisher).await.unwrap(), 1);
        assert_eq!(manager.pending_event_count(), 0);
        assert_eq!(publisher.events()[0].name(), "AlertTriggered");
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_state() {
        let mut manager = AlertManager::new();
        let id = manager.register(cpu_alert(AlertConfiguration::default()));
        manager.evaluate_metric_at("cpu_usage", &gauge(95.0), t0());

        let publisher = RecordingPublisher::new().fail_after(0);
        assert!(manager.publish_pending(&publisher).await.is_err());
        assert_eq!(manager.get(&id).map(|a| a.status()), Some(AlertStatus::Triggered));
        assert_eq!(manager.pending_event_count(), 1);
    }
}
