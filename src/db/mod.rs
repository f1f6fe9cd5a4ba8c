//! Database driver layer.
//!
//! This module provides the driver side of client lifecycles:
//! - Database-specific client handles (sqlx pools, MongoDB client)
//! - The `Connector` trait the lifecycle drives them through

pub mod connector;
pub mod pool;

pub use connector::{Connector, DriverConnector};
pub use pool::DbPool;
