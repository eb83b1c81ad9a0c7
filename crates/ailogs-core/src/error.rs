//! Error types for ailogs
//!
//! This module defines the error types used throughout the ailogs crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use ailogs_core::error::{AilogsError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to AilogsError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use thiserror::Error;

use crate::types::LogId;

/// Error codes reported by the remote log store
///
/// Some codes gate UI affordances (an action is hidden when the caller lacks
/// permission) but none of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorCode {
    PermissionDenied,
    ValidationFailed,
    NotFound,
    Unavailable,
    Other(String),
}

impl RemoteErrorCode {
    /// Parse a wire error code such as `PERMISSION_DENIED`
    pub fn parse(code: &str) -> Self {
        match code.to_ascii_uppercase().replace('-', "_").as_str() {
            "PERMISSION_DENIED" | "FORBIDDEN" | "UNAUTHORIZED" => Self::PermissionDenied,
            "VALIDATION_FAILED" | "VALIDATION_ERROR" | "BAD_REQUEST" => Self::ValidationFailed,
            "NOT_FOUND" => Self::NotFound,
            "UNAVAILABLE" | "SERVICE_UNAVAILABLE" | "TIMEOUT" => Self::Unavailable,
            _ => Self::Other(code.to_string()),
        }
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::ValidationFailed => write!(f, "VALIDATION_FAILED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Main error type for ailogs operations
#[derive(Error, Debug)]
pub enum AilogsError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client-side validation failure, reported against a single field
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// Human readable explanation
        message: String,
    },

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the log store
    #[error("{message}")]
    Remote {
        /// Message suitable for a notification
        message: String,
        /// Parsed error code, when the store supplied one
        code: Option<RemoteErrorCode>,
    },

    /// Serialization failure while building an export
    #[error("Export failed: {0}")]
    Export(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Log record does not exist
    #[error("Log not found: {0}")]
    NotFound(LogId),
}

impl AilogsError {
    /// Shorthand for a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a remote error from a message and an optional wire code
    pub fn remote(message: impl Into<String>, code: Option<&str>) -> Self {
        Self::Remote {
            message: message.into(),
            code: code.map(RemoteErrorCode::parse),
        }
    }

    /// Error code to gate UI affordances on
    pub fn code(&self) -> Option<&RemoteErrorCode> {
        match self {
            Self::Remote { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

/// Convenience type alias for Results in ailogs
pub type Result<T> = std::result::Result<T, AilogsError>;
