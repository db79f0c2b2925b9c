//! Error types for the batch engine.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for batch engine operations.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Backend execution errors (driver failures, constraint violations, etc.)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Statement preparation errors (duplicate parameter names, bad text, etc.)
    #[error("Statement error: {0}")]
    Statement(String),

    /// Command dispatch errors (no command registered for a method, etc.)
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Transaction errors (begin/commit/rollback failures).
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Protocol errors (absent request, forbidden envelope flag combinations).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors (invalid options file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal engine errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Creates a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a statement error with the given message.
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// Creates a dispatch error with the given message.
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Creates a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Creates a protocol error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns a short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "backend",
            Self::Statement(_) => "statement",
            Self::Dispatch(_) => "dispatch",
            Self::Transaction(_) => "transaction",
            Self::Protocol(_) => "protocol",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Backend(_) => "Backend Error",
            Self::Statement(_) => "Statement Error",
            Self::Dispatch(_) => "Dispatch Error",
            Self::Transaction(_) => "Transaction Error",
            Self::Protocol(_) => "Protocol Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using CourierError.
pub type Result<T> = std::result::Result<T, CourierError>;
