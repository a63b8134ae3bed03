//! Structured log records consumed by incident analysis.
//!
//! Also installs the crate's `tracing` subscriber for embedding binaries and tests.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
    /// Fatal level
    Fatal = 5,
}

impl LogLevel {
    /// Error or Fatal.
    pub fn is_error(&self) -> bool {
        *self >= LogLevel::Error
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Log category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Application,
    Security,
    Performance,
    Database,
    System,
    Audit,
}

/// Request-scoped identifiers attached to a log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub user_id: Option<String>,
    pub workflow_id: Option<String>,
    pub request_id: Option<String>,
}

/// A structured log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp
    pub timestamp: Timestamp,
    /// Log level
    pub level: LogLevel,
    /// Message
    pub message: String,
    /// Category
    pub category: LogCategory,
    /// Emitting component
    pub source: String,
    /// Request context
    pub context: LogContext,
}

impl LogEntry {
    /// Create a new application log entry stamped now.
    pub fn new(level: LogLevel, message: &str) -> Self {
        Self {
            timestamp: now(),
            level,
            message: message.to_string(),
            category: LogCategory::Application,
            source: String::new(),
            context: LogContext::default(),
        }
    }

    /// Set timestamp.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set category.
    pub fn with_category(mut self, category: LogCategory) -> Self {
        self.category = category;
        self
    }

    /// Set source component.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Set user.
    pub fn with_user(mut self, user_id: &str) -> Self {
        self.context.user_id = Some(user_id.to_string());
        self
    }

    /// Set workflow.
    pub fn with_workflow(mut self, workflow_id: &str) -> Self {
        self.context.workflow_id = Some(workflow_id.to_string());
        self
    }

    /// Set request.
    pub fn with_request(mut self, request_id: &str) -> Self {
        self.context.request_id = Some(request_id.to_string());
        self
    }

    /// User ID, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.context.user_id.as_deref()
    }

    /// Workflow ID, if any.
    pub fn workflow_id(&self) -> Option<&str> {
        self.context.workflow_id.as_deref()
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as text.
    pub fn to_text(&self) -> String {
        format!(
            "{} {} [{}] {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.source,
            self.message
        )
    }
}

/// Install a `tracing` fmt subscriber at the given maximum level.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(level: tracing::Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok()
}
