//! Error types for database modules.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Startup errors (connect and verification) are fatal to the application, shutdown
//! errors are collected so that one failing client never blocks the others.

use crate::models::ClientState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Client '{client}' failed to connect: {source}")]
    ConnectFailed {
        client: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Client '{client}' failed verification: {source}")]
    VerificationFailed {
        client: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Client '{client}' failed to disconnect: {source}")]
    DisconnectFailed {
        client: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Start hook '{hook}' failed: {source}")]
    StartFailed {
        hook: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Shutdown finished with {} failed hook(s)", failures.len())]
    Shutdown { failures: Vec<DbError> },

    #[error("Client not found: {tag}")]
    ClientNotFound { tag: String },

    #[error("Client tag already registered: {tag}")]
    DuplicateTag { tag: String },

    #[error("Client '{tag}' is not ready (state: {state})")]
    NotReady { tag: String, state: ClientState },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn connect_failed(client: impl Into<String>, source: DbError) -> Self {
        Self::ConnectFailed {
            client: client.into(),
            source: Box::new(source),
        }
    }

    pub fn verification_failed(client: impl Into<String>, source: DbError) -> Self {
        Self::VerificationFailed {
            client: client.into(),
            source: Box::new(source),
        }
    }

    pub fn disconnect_failed(client: impl Into<String>, source: DbError) -> Self {
        Self::DisconnectFailed {
            client: client.into(),
            source: Box::new(source),
        }
    }

    pub fn start_failed(hook: impl Into<String>, source: DbError) -> Self {
        Self::StartFailed {
            hook: hook.into(),
            source: Box::new(source),
        }
    }

    /// Create a client not found error.
    pub fn client_not_found(tag: impl Into<String>) -> Self {
        Self::ClientNotFound { tag: tag.into() }
    }

    pub fn duplicate_tag(tag: impl Into<String>) -> Self {
        Self::DuplicateTag { tag: tag.into() }
    }

    pub fn not_ready(tag: impl Into<String>, state: ClientState) -> Self {
        Self::NotReady {
            tag: tag.into(),
            state,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, walking wrapped sources.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::ConnectFailed { source, .. }
            | Self::VerificationFailed { source, .. }
            | Self::DisconnectFailed { source, .. }
            | Self::StartFailed { source, .. } => source.suggestion(),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Nothing in this crate retries; callers restarting the application use this
    /// to tell transient failures from configuration mistakes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::ConnectFailed { source, .. }
            | Self::VerificationFailed { source, .. }
            | Self::StartFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// True when the root cause is an elapsed deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::ConnectFailed { source, .. }
            | Self::VerificationFailed { source, .. }
            | Self::DisconnectFailed { source, .. }
            | Self::StartFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => DbError::connection(
                db_err.message().to_string(),
                "Check that the database exists and the user may access it",
            ),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a pooled connection",
                "Increase acquire_timeout or max_connections",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the application")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        DbError::connection(
            err.to_string(),
            "Check that the MongoDB deployment is reachable and the URI is valid",
        )
    }
}

/// Result type alias for database module operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_timeout_display() {
        let err = DbError::timeout("connect mongo_a", 5000);
        assert_eq!(err.to_string(), "Timeout: connect mongo_a exceeded 5000ms");
    }

    #[test]
    fn test_suggestion_walks_sources() {
        let err = DbError::connect_failed(
            "db_main",
            DbError::connection("refused", "Check that the server is running"),
        );
        assert_eq!(err.suggestion(), Some("Check that the server is running"));
        assert_eq!(DbError::client_not_found("x").suggestion(), None);
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::timeout("ping", 30).is_retryable());
        assert!(DbError::connection("err", "sugg").is_retryable());
        assert!(DbError::connect_failed("a", DbError::timeout("connect", 10)).is_retryable());
        assert!(!DbError::invalid_input("empty namespace").is_retryable());
        assert!(!DbError::duplicate_tag("db_a").is_retryable());
    }

    #[test]
    fn test_is_timeout_nested() {
        let err = DbError::start_failed(
            "db_a",
            DbError::verification_failed("db_a", DbError::timeout("ping", 10)),
        );
        assert!(err.is_timeout());
        assert!(!DbError::cancelled("connect").is_timeout());
    }

    #[test]
    fn test_shutdown_counts_failures() {
        let err = DbError::Shutdown {
            failures: vec![
                DbError::disconnect_failed("a", DbError::internal("boom")),
                DbError::disconnect_failed("b", DbError::internal("boom")),
            ],
        };
        assert_eq!(err.to_string(), "Shutdown finished with 2 failed hook(s)");
    }

    #[test]
    fn test_not_ready_includes_state() {
        let err = DbError::not_ready("db_a", ClientState::Connecting);
        assert!(err.to_string().contains("connecting"));
    }
}
