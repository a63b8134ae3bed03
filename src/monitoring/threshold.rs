//! Threshold conditions.
//!
//! Pure evaluation of a numeric value against a configured condition.
//! Range operators are validated when the threshold is built, so
//! `evaluate` never fails.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Alert severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Critical
    Critical,
    /// Emergency
    Emergency,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
            Severity::Emergency => write!(f, "emergency"),
        }
    }
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdOperator {
    #[serde(rename = "GT")]
    GreaterThan,
    #[serde(rename = "LT")]
    LessThan,
    #[serde(rename = "EQ")]
    Equal,
    #[serde(rename = "NEQ")]
    NotEqual,
    #[serde(rename = "GTE")]
    GreaterOrEqual,
    #[serde(rename = "LTE")]
    LessOrEqual,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "NOT_BETWEEN")]
    NotBetween,
}

impl ThresholdOperator {
    /// Whether the operator needs a second bound.
    pub fn is_range(&self) -> bool {
        matches!(self, ThresholdOperator::Between | ThresholdOperator::NotBetween)
    }
}

/// A validated threshold condition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Threshold {
    operator: ThresholdOperator,
    value: f64,
    second_value: Option<f64>,
    severity: Severity,
}

impl Threshold {
    /// Create a threshold.
    ///
    /// `Between`/`NotBetween` require `second_value` strictly greater than
    /// `value`. Single-bound operators ignore `second_value`.
    pub fn new(
        operator: ThresholdOperator,
        value: f64,
        second_value: Option<f64>,
        severity: Severity,
    ) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::validation("threshold value must be finite"));
        }

        let second_value = if operator.is_range() {
            match second_value {
                Some(upper) if upper.is_finite() && value < upper => Some(upper),
                Some(upper) => {
                    return Err(Error::validation(format!(
                        "range threshold requires lower < upper, got {} and {}",
                        value, upper
                    )))
                }
                None => {
                    return Err(Error::validation(
                        "range threshold requires a second value",
                    ))
                }
            }
        } else {
            None
        };

        Ok(Self {
            operator,
            value,
            second_value,
            severity,
        })
    }

    /// `v > value`
    pub fn greater_than(value: f64) -> Result<Self> {
        Self::new(ThresholdOperator::GreaterThan, value, None, Severity::Warning)
    }

    /// `v < value`
    pub fn less_than(value: f64) -> Result<Self> {
        Self::new(ThresholdOperator::LessThan, value, None, Severity::Warning)
    }

    /// `v == value`
    pub fn equal_to(value: f64) -> Result<Self> {
        Self::new(ThresholdOperator::Equal, value, None, Severity::Warning)
    }

    /// `lower <= v <= upper`
    pub fn between(lower: f64, upper: f64) -> Result<Self> {
        Self::new(ThresholdOperator::Between, lower, Some(upper), Severity::Warning)
    }

    /// `v < lower || v > upper`
    pub fn not_between(lower: f64, upper: f64) -> Result<Self> {
        Self::new(ThresholdOperator::NotBetween, lower, Some(upper), Severity::Warning)
    }

    /// Set severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Check if value crosses this threshold.
    pub fn evaluate(&self, value: f64) -> bool {
        // Range operators always carry an upper bound after construction.
        let upper = self.second_value.unwrap_or(self.value);
        match self.operator {
            ThresholdOperator::GreaterThan => value > self.value,
            ThresholdOperator::LessThan => value < self.value,
            ThresholdOperator::Equal => value == self.value,
            ThresholdOperator::NotEqual => value != self.value,
            ThresholdOperator::GreaterOrEqual => value >= self.value,
            ThresholdOperator::LessOrEqual => value <= self.value,
            ThresholdOperator::Between => value >= self.value && value <= upper,
            ThresholdOperator::NotBetween => value < self.value || value > upper,
        }
    }

    /// Human readable condition.
    pub fn describe(&self) -> String {
        let upper = self.second_value.unwrap_or(self.value);
        match self.operator {
            ThresholdOperator::GreaterThan => format!("greater than {}", self.value),
            ThresholdOperator::LessThan => format!("less than {}", self.value),
            ThresholdOperator::Equal => format!("equal to {}", self.value),
            ThresholdOperator::NotEqual => format!("not equal to {}", self.value),
            ThresholdOperator::GreaterOrEqual => {
                format!("greater than or equal to {}", self.value)
            }
            ThresholdOperator::LessOrEqual => format!("less than or equal to {}", self.value),
            ThresholdOperator::Between => format!("between {} and {}", self.value, upper),
            ThresholdOperator::NotBetween => format!("not between {} and {}", self.value, upper),
        }
    }

    /// Operator.
    pub fn operator(&self) -> ThresholdOperator {
        self.operator
    }

    /// Primary bound.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Upper bound for range operators.
    pub fn second_value(&self) -> Option<f64> {
        self.second_value
    }

    /// Severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Serializable threshold configuration, validated by [`ThresholdDefinition::build`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdDefinition {
    /// Operator
    pub operator: ThresholdOperator,
    /// Primary bound
    pub value: f64,
    /// Upper bound for range operators
    #[serde(default)]
    pub second_value: Option<f64>,
    /// Severity
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Warning
}

impl ThresholdDefinition {
    /// Validate into a threshold.
    pub fn build(&self) -> Result<Threshold> {
        Threshold::new(self.operator, self.value, self.second_value, self.severity)
    }
}
