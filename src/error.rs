//! Error types for the gateway.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration errors (unreadable config file, unknown target name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Audit trail errors (audit store unreachable, record not persisted, etc.)
    #[error("Audit error: {0}")]
    Audit(String),

    /// Report errors (bad date range, audit store unreadable for reads, etc.)
    #[error("Report error: {0}")]
    Report(String),
}

impl RelayError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an audit error with the given message.
    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit(msg.into())
    }

    /// Creates a report error with the given message.
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Audit(_) => "Audit Error",
            Self::Report(_) => "Report Error",
        }
    }
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
