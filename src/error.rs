//! Error types and handling for the typhoon monitor

use thiserror::Error;

/// Main error type for the typhoon monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream weather service errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Malformed upstream record (coordinates, lead times, ...)
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Snapshot cache errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::Config { .. } => {
                "Configuration error. Please check your config file and CWA API key.".to_string()
            }
            MonitorError::Api { .. } => {
                "Unable to reach the weather service. Showing the last known data.".to_string()
            }
            MonitorError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            MonitorError::Parse { message } => {
                format!("Unreadable weather record: {message}")
            }
            MonitorError::Cache { .. } => {
                "Snapshot cache failed. You may need to clear the cache directory.".to_string()
            }
            MonitorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
