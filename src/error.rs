//! Error types for the workbench.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

use crate::backend::StatusCode;

/// Main error type for workbench operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchError {
    /// Connection errors (no connection selected, unknown database, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query errors raised before dispatch (syntax errors, empty statements, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Structured error returned by the query execution service.
    #[error("Backend error ({status}): {message}")]
    Backend { status: StatusCode, message: String },

    /// Transport errors (host unreachable, malformed response, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkbenchError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a backend error carrying the service's own message.
    pub fn backend(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: msg.into(),
        }
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Backend { .. } => "Backend Error",
            Self::Transport(_) => "Transport Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Message shown to the user in a failure result.
    ///
    /// The service's structured message wins; anything else falls back to
    /// the display string.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }

    /// Status code to publish alongside a failure result.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend { status, .. } => *status,
            Self::Transport(_) => StatusCode::Unavailable,
            _ => StatusCode::Unknown,
        }
    }
}

/// Result type alias using WorkbenchError.
pub type Result<T> = std::result::Result<T, WorkbenchError>;
