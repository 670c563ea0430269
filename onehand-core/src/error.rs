/// Structured error types for onehand-core.
///
/// Library code returns `OneHandError`; the `onehand` binary wraps these in
/// `anyhow` for reporting.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Main error type for onehand-core operations
#[derive(Error, Debug)]
pub enum OneHandError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Config value is missing or unusable
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// User input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON parsing or serialization failed
    #[error("JSON error at {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },
}

/// Result type alias for onehand-core operations
pub type Result<T> = std::result::Result<T, OneHandError>;

impl OneHandError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a config parse error for a given file
    pub fn config_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a JSON error with context
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OneHandError::config("jwt secret must be at least 32 bytes");
        assert_eq!(
            err.to_string(),
            "Configuration error: jwt secret must be at least 32 bytes"
        );

        let err = OneHandError::config_parse("/tmp/config.toml", "expected a table");
        assert!(err.to_string().contains("Invalid config file"));
        assert!(err.to_string().contains("/tmp/config.toml"));
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: OneHandError = ValidationError::Empty { field: "description" }.into();
        assert_eq!(err.to_string(), "description cannot be empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OneHandError = io_err.into();

        assert!(matches!(err, OneHandError::Io { .. }));
    }
}
