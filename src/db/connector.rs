//! Connector seam between the lifecycle and a database driver.
//!
//! The lifecycle only needs three operations from a driver: open a client,
//! ping it, close it. [`DriverConnector`] implements them over [`DbPool`];
//! tests plug in their own connectors to control timing and failures.

use crate::db::pool::DbPool;
use crate::error::DbResult;
use crate::models::ClientOptions;
use std::future::Future;
use tracing::debug;

pub trait Connector: Send + Sync + 'static {
    /// Live client handed out through the registry.
    type Client: Clone + Send + Sync + 'static;

    /// Open a client. Must not report success before the transport is usable
    /// or, for lazily connecting drivers, before options are fully resolved.
    fn connect(
        &self,
        options: &ClientOptions,
    ) -> impl Future<Output = DbResult<Self::Client>> + Send;

    /// Reachability check run after a successful connect.
    fn ping(&self, client: &Self::Client) -> impl Future<Output = DbResult<()>> + Send;

    fn disconnect(&self, client: &Self::Client) -> impl Future<Output = DbResult<()>> + Send;
}

/// Connector backed by the sqlx and MongoDB drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverConnector;

impl Connector for DriverConnector {
    type Client = DbPool;

    async fn connect(&self, options: &ClientOptions) -> DbResult<DbPool> {
        debug!(uri = %options.masked_uri(), "Opening client");
        DbPool::connect(options).await
    }

    async fn ping(&self, client: &DbPool) -> DbResult<()> {
        client.ping().await
    }

    async fn disconnect(&self, client: &DbPool) -> DbResult<()> {
        client.close().await;
        Ok(())
    }
}
