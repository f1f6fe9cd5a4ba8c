//! Data models for database modules.
//!
//! This module re-exports all model types used throughout the crate.

pub mod client;

// Re-export commonly used types
pub use client::{
    ClientOptions, ClientSpec, ClientState, ClientSummary, DatabaseType, TimeoutConfig,
};
