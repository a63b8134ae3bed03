//! Incident correlation windows and cut points.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Windows (in minutes) and thresholds used by the correlation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorrelationConfig {
    /// Half-width of the report timeline
    pub timeline_window_minutes: u32,
    /// Lookback for the report's error analysis
    pub error_lookback_minutes: u32,
    /// Lookback for each user journey
    pub journey_lookback_minutes: u32,
    /// Half-width of the metric correlation window
    pub correlation_window_minutes: u32,
    /// Distance between a metric sample and a related log
    pub related_log_window_minutes: u32,
    /// Error progression bucket width
    pub bucket_minutes: u32,
    /// Longest lookback accepted by error analysis
    pub max_lookback_minutes: u32,
    /// Error count above which an overload is suspected
    pub overload_error_count: usize,
    /// Counter value above which a correlation is high
    pub counter_threshold: f64,
    /// Gauge value above which a correlation is medium
    pub gauge_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            timeline_window_minutes: 60,
            error_lookback_minutes: 60,
            journey_lookback_minutes: 120,
            correlation_window_minutes: 30,
            related_log_window_minutes: 5,
            bucket_minutes: 5,
            max_lookback_minutes: 7 * 24 * 60,
            overload_error_count: 50,
            counter_threshold: 100.0,
            gauge_threshold: 80.0,
        }
    }
}

impl CorrelationConfig {
    /// Check that every window is positive and thresholds are finite.
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("timelineWindowMinutes", self.timeline_window_minutes),
            ("errorLookbackMinutes", self.error_lookback_minutes),
            ("journeyLookbackMinutes", self.journey_lookback_minutes),
            ("correlationWindowMinutes", self.correlation_window_minutes),
            ("relatedLogWindowMinutes", self.related_log_window_minutes),
            ("bucketMinutes", self.bucket_minutes),
            ("maxLookbackMinutes", self.max_lookback_minutes),
        ];
        for (name, minutes) in windows {
            if minutes == 0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }

        if self.error_lookback_minutes > self.max_lookback_minutes {
            return Err(Error::Config(format!(
                "errorLookbackMinutes {} exceeds maxLookbackMinutes {}",
                self.error_lookback_minutes, self.max_lookback_minutes
            )));
        }

        if !self.counter_threshold.is_finite() || !self.gauge_threshold.is_finite() {
            return Err(Error::Config("correlation thresholds must be finite".to_string()));
        }

        Ok(())
    }
}
