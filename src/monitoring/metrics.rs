//! Metric samples.
//!
//! Typed numeric measurements with unit-aware display formatting.

use crate::core::{now, Dimensions, Error, Result, Timestamp};
use serde::{Deserialize, Serialize};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Metric type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    /// Monotonic count
    Counter,
    /// Point-in-time level
    Gauge,
    /// Duration in milliseconds
    Timer,
    /// Ratio in [0, 100]
    Percentage,
    /// Size in bytes
    Bytes,
}

impl MetricType {
    /// Whether values of this type must be non-negative.
    pub fn is_non_negative(&self) -> bool {
        !matches!(self, MetricType::Gauge)
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricType::Counter => write!(f, "counter"),
            MetricType::Gauge => write!(f, "gauge"),
            MetricType::Timer => write!(f, "timer"),
            MetricType::Percentage => write!(f, "percentage"),
            MetricType::Bytes => write!(f, "bytes"),
        }
    }
}

/// A single typed measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    value: f64,
    metric_type: MetricType,
    unit: String,
    precision: usize,
    timestamp: Timestamp,
}

impl MetricValue {
    /// Create a new value stamped with the current time.
    pub fn new(value: f64, metric_type: MetricType, unit: &str) -> Result<Self> {
        Self::at(value, metric_type, unit, now())
    }

    /// Create a new value with an explicit timestamp.
    pub fn at(value: f64, metric_type: MetricType, unit: &str, timestamp: Timestamp) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::validation(format!("metric value must be finite, got {}", value)));
        }
        if metric_type.is_non_negative() && value < 0.0 {
            return Err(Error::validation(format!(
                "{} value must be non-negative, got {}",
                metric_type, value
            )));
        }
        if metric_type == MetricType::Percentage && value > 100.0 {
            return Err(Error::validation(format!(
                "percentage must be within [0, 100], got {}",
                value
            )));
        }

        Ok(Self {
            value,
            metric_type,
            unit: unit.to_string(),
            precision: 2,
            timestamp,
        })
    }

    /// Counter value.
    pub fn counter(value: f64) -> Result<Self> {
        Self::new(value, MetricType::Counter, "")
    }

    /// Gauge value with a unit.
    pub fn gauge(value: f64, unit: &str) -> Result<Self> {
        Self::new(value, MetricType::Gauge, unit)
    }

    /// Timer value in milliseconds.
    pub fn timer(millis: f64) -> Result<Self> {
        Self::new(millis, MetricType::Timer, "ms")
    }

    /// Percentage value.
    pub fn percentage(value: f64) -> Result<Self> {
        Self::new(value, MetricType::Percentage, "%")
    }

    /// Size in bytes.
    pub fn bytes(value: f64) -> Result<Self> {
        Self::new(value, MetricType::Bytes, "B")
    }

    /// Set display precision.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set timestamp.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Raw numeric value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Metric type.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Unit label.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Display precision.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Sample time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Render the value for humans.
    pub fn format(&self) -> String {
        let p = self.precision;
        let v = self.value;
        match self.metric_type {
            MetricType::Timer => {
                if v < MS_PER_SECOND {
                    format!("{:.*}ms", p, v)
                } else if v < MS_PER_MINUTE {
                    format!("{:.*}s", p, v / MS_PER_SECOND)
                } else if v < MS_PER_HOUR {
                    format!("{:.*}m", p, v / MS_PER_MINUTE)
                } else {
                    format!("{:.*}h", p, v / MS_PER_HOUR)
                }
            }
            MetricType::Bytes => {
                if v < KIB {
                    format!("{:.*} B", p, v)
                } else if v < MIB {
                    format!("{:.*} KB", p, v / KIB)
                } else if v < GIB {
                    format!("{:.*} MB", p, v / MIB)
                } else {
                    format!("{:.*} GB", p, v / GIB)
                }
            }
            MetricType::Percentage => format!("{:.*}%", p, v),
            MetricType::Counter => with_unit(format!("{}", v.round() as i64), &self.unit),
            MetricType::Gauge => with_unit(format!("{:.*}", p, v), &self.unit),
        }
    }
}

fn with_unit(rendered: String, unit: &str) -> String {
    if unit.is_empty() {
        rendered
    } else {
        format!("{} {}", rendered, unit)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// A named sample as stored by a metric store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Sample value
    pub value: MetricValue,
    /// Labels
    pub dimensions: Dimensions,
}

impl Metric {
    /// Create a new metric sample.
    pub fn new(name: &str, value: MetricValue) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::validation("metric name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            value,
            dimensions: Dimensions::new(),
        })
    }

    /// Attach dimensions.
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sample time.
    pub fn timestamp(&self) -> Timestamp {
        self.value.timestamp()
    }

    /// Metric type of the sample.
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }
}
