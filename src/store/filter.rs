//! Query filters for logs and metrics.

use crate::core::{Dimensions, TimeRange};
use crate::monitoring::logging::{LogCategory, LogEntry, LogLevel};
use crate::monitoring::metrics::{Metric, MetricType};
use serde::{Deserialize, Serialize};

/// Filter for querying log entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Inclusive time window
    pub range: Option<TimeRange>,
    /// Filter by user
    pub user_id: Option<String>,
    /// Filter by workflow
    pub workflow_id: Option<String>,
    /// Filter by request
    pub request_id: Option<String>,
    /// Filter by emitting component
    pub component: Option<String>,
    /// Minimum level
    pub min_level: Option<LogLevel>,
    /// Filter by category
    pub category: Option<LogCategory>,
    /// Maximum results
    pub limit: Option<usize>,
}

impl LogFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a time window.
    pub fn in_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Filter by user.
    pub fn by_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Filter by workflow.
    pub fn by_workflow(mut self, workflow_id: &str) -> Self {
        self.workflow_id = Some(workflow_id.to_string());
        self
    }

    /// Filter by request.
    pub fn by_request(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    /// Filter by component.
    pub fn by_component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    /// Filter by minimum level.
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Filter by category.
    pub fn by_category(mut self, category: LogCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Copy the entity filters of `other`, keeping this filter's range.
    pub fn merge(mut self, other: &LogFilter) -> Self {
        self.user_id = other.user_id.clone().or(self.user_id);
        self.workflow_id = other.workflow_id.clone().or(self.workflow_id);
        self.request_id = other.request_id.clone().or(self.request_id);
        self.component = other.component.clone().or(self.component);
        self.min_level = other.min_level.or(self.min_level);
        self.category = other.category.or(self.category);
        self.limit = other.limit.or(self.limit);
        self
    }

    /// Check if an entry matches this filter.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(range) = &self.range {
            if !range.contains(entry.timestamp) {
                return false;
            }
        }

        if let Some(user_id) = &self.user_id {
            if entry.context.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }

        if let Some(workflow_id) = &self.workflow_id {
            if entry.context.workflow_id.as_ref() != Some(workflow_id) {
                return false;
            }
        }

        if let Some(request_id) = &self.request_id {
            if entry.context.request_id.as_ref() != Some(request_id) {
                return false;
            }
        }

        if let Some(component) = &self.component {
            if &entry.source != component {
                return false;
            }
        }

        if let Some(min_level) = self.min_level {
            if entry.level < min_level {
                return false;
            }
        }

        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }

        true
    }
}

/// Filter for querying metric samples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricFilter {
    /// Filter by name
    pub name: Option<String>,
    /// Filter by type
    pub metric_type: Option<MetricType>,
    /// Required dimensions
    pub dimensions: Dimensions,
}

impl MetricFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by name.
    pub fn by_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Filter by type.
    pub fn by_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }

    /// Require dimensions.
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Check if a sample matches this filter.
    pub fn matches(&self, metric: &Metric) -> bool {
        if let Some(name) = &self.name {
            if &metric.name != name {
                return false;
            }
        }

        if let Some(metric_type) = self.metric_type {
            if metric.metric_type() != metric_type {
                return false;
            }
        }

        metric.dimensions.matches(&self.dimensions)
    }
}
