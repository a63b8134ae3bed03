//! Error type extraction from log entries.

use crate::monitoring::logging::LogEntry;

/// Fallback type for messages without a recognizable prefix.
pub const UNKNOWN_ERROR_TYPE: &str = "Unknown";

/// Derives a histogram key from an error log entry.
pub trait ErrorTypeExtractor: Send + Sync {
    fn extract(&self, entry: &LogEntry) -> String;
}

/// Uses the message text before the first `:`.
///
/// `"DatabaseError: pool exhausted"` yields `"DatabaseError"`. Messages with
/// no colon, or an empty prefix, yield [`UNKNOWN_ERROR_TYPE`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixErrorTypeExtractor;

impl ErrorTypeExtractor for PrefixErrorTypeExtractor {
    fn extract(&self, entry: &LogEntry) -> String {
        match entry.message.split_once(':') {
            Some((prefix, _)) if !prefix.trim().is_empty() => prefix.trim().to_string(),
            _ => UNKNOWN_ERROR_TYPE.to_string(),
        }
    }
}

impl<F> ErrorTypeExtractor for F
where
    F: Fn(&LogEntry) -> String + Send + Sync,
{
    fn extract(&self, entry: &LogEntry) -> String {
        self(entry)
    }
}
