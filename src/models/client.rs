//! Client-related data models.
//!
//! This module defines client connection options, per-module timeouts and the
//! lifecycle state a registered client moves through.

use crate::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PING_TIMEOUT_SECS, PoolOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
    MongoDB,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else if lower.starts_with("mongodb://") || lower.starts_with("mongodb+srv://") {
            Some(Self::MongoDB)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
            Self::MongoDB => "MongoDB",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Driver-level options for one client.
///
/// Built from a raw URI without validation; the driver rejects bad URIs when the
/// client connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    uri: String,
    #[serde(default)]
    pool: PoolOptions,
    #[serde(default)]
    app_name: Option<String>,
}

impl ClientOptions {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            pool: PoolOptions::default(),
            app_name: None,
        }
    }

    pub fn with_pool_options(mut self, pool: PoolOptions) -> Self {
        self.pool = pool;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.pool.max_connections = Some(max);
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.pool.min_connections = Some(min);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool.idle_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool.acquire_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn test_before_acquire(mut self, test: bool) -> Self {
        self.pool.test_before_acquire = Some(test);
        self
    }

    /// Application name reported to the server (PostgreSQL `application_name`,
    /// MongoDB `appName`).
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn pool(&self) -> &PoolOptions {
        &self.pool
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Database type detected from the URI scheme.
    pub fn db_type(&self) -> Option<DatabaseType> {
        DatabaseType::from_connection_string(&self.uri)
    }

    /// Get a display-safe version of the URI (credentials masked).
    pub fn masked_uri(&self) -> String {
        if let Some(at_pos) = self.uri.find('@') {
            if let Some(colon_pos) = self.uri[..at_pos].rfind(':') {
                // ':' right after the scheme means there is no password
                if !self.uri[colon_pos..].starts_with("://") {
                    let prefix = &self.uri[..colon_pos + 1];
                    let suffix = &self.uri[at_pos..];
                    return format!("{}****{}", prefix, suffix);
                }
            }
        }
        self.uri.clone()
    }
}

/// A logical client name bound to its connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    pub name: String,
    pub options: ClientOptions,
}

impl ClientSpec {
    pub fn new(name: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Budgets for the two start phases of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget for establishing the connection.
    pub connect: Duration,
    /// Budget for the reachability check.
    pub ping: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, ping: Duration) -> Self {
        Self { connect, ping }
    }

    /// Split one total budget evenly between connect and ping.
    pub fn split(total: Duration) -> Self {
        let half = total / 2;
        Self {
            connect: half,
            ping: half,
        }
    }

    pub fn total(&self) -> Duration {
        self.connect.saturating_add(self.ping)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            ping: Duration::from_secs(DEFAULT_PING_TIMEOUT_SECS),
        }
    }
}

/// Lifecycle state of a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
    Unconnected,
    Connecting,
    Verifying,
    Ready,
    Disconnecting,
    Closed,
    /// Connect or verification failed; the client never became ready
    Failed,
}

impl ClientState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if the client can no longer become ready.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connecting => "connecting",
            Self::Verifying => "verifying",
            Self::Ready => "ready",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client information returned by registry listings (no secrets exposed).
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub state: ClientState,
}
