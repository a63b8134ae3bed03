//! Error types for Vigil.

use thiserror::Error;

/// Result type alias for Vigil operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Vigil operations.
#[derive(Error, Debug)]
pub enum Error {
    // Construction errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Collaborator errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = Error::validation("name must not be empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed: name must not be empty");
    }

    #[test]
    fn test_json_error_maps_to_deserialization() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
