//! Database Modules Library
//!
//! This library registers named database clients (SQLite, PostgreSQL, MySQL and
//! MongoDB) with an application container that connects and verifies them on
//! start and disconnects them on stop.
//!
//! MongoDB support comes from the `mongodb` feature, which is on by default.
//! Building with `--no-default-features` leaves only the SQL drivers, and a
//! `mongodb://` URI then fails to connect with a suggestion to enable it.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod module;
pub mod registry;

pub use app::{App, AppBuilder};
pub use config::Config;
pub use db::{Connector, DbPool, DriverConnector};
pub use error::{DbError, DbResult};
pub use lifecycle::{ClientHandle, LifecycleContext};
pub use models::{ClientOptions, ClientState, TimeoutConfig};
pub use module::Module;
pub use registry::Registry;
