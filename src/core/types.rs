//! Common types used across Vigil modules.

use crate::core::error::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Build a duration from a whole number of minutes.
pub fn minutes(count: i64) -> Duration {
    Duration::minutes(count)
}

/// An inclusive span of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range
    pub start: Timestamp,
    /// End of the range
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a new range. Fails if `start` is after `end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!(
                "time range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Symmetric window `[center - minutes, center + minutes]`.
    pub fn around(center: Timestamp, window_minutes: u32) -> Self {
        let span = minutes(window_minutes as i64);
        Self {
            start: center - span,
            end: center + span,
        }
    }

    /// Window `[end - minutes, end]`.
    pub fn last_minutes(end: Timestamp, window_minutes: u32) -> Self {
        Self {
            start: end - minutes(window_minutes as i64),
            end,
        }
    }

    /// Check whether a timestamp falls inside the range (inclusive).
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Length of the range.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Check whether two ranges share at least one instant.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Label set attached to a metric sample.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions(BTreeMap<String, String>);

impl Dimensions {
    /// Create an empty dimension set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension. Keys must be non-empty.
    pub fn with(mut self, key: &str, value: &str) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Insert or replace a dimension.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::validation("dimension key must not be empty"));
        }
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Get a dimension value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    /// Check that every dimension in `other` is present here with the same value.
    pub fn matches(&self, other: &Dimensions) -> bool {
        other.0.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over dimensions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}
