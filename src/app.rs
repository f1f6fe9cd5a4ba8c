//! Application container.
//!
//! An [`App`] owns the registry of client handles and the lifecycle that
//! connects and disconnects them. Handles can be resolved as soon as the app is
//! built; their clients become available once [`App::start`] returns.
//!
//! ```no_run
//! use db_modules::app::App;
//! use db_modules::module::{Module, with_uris};
//!
//! # async fn example() -> db_modules::DbResult<()> {
//! let mut app = App::builder()
//!     .module(Module::new(
//!         "store",
//!         [with_uris([
//!             ("orders", "postgres://localhost/orders"),
//!             ("audit", "postgres://localhost/audit"),
//!         ])],
//!     ))
//!     .module(Module::simple("cache", "sqlite::memory:"))
//!     .build()?;
//!
//! app.start().await?;
//! let orders = app.resolve("store", "orders")?.client().await?;
//! # let _ = orders;
//! app.stop().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{DEFAULT_START_TIMEOUT_SECS, DEFAULT_STOP_TIMEOUT_SECS};
use crate::db::{Connector, DriverConnector};
use crate::error::{DbError, DbResult};
use crate::lifecycle::{ClientHandle, Lifecycle, LifecycleContext, client_hook};
use crate::module::Module;
use crate::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct AppBuilder<C: Connector> {
    connector: Arc<C>,
    modules: Vec<Module>,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl AppBuilder<DriverConnector> {
    pub fn new() -> Self {
        Self::with_connector(DriverConnector)
    }
}

impl Default for AppBuilder<DriverConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> AppBuilder<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            modules: Vec::new(),
            start_timeout: Duration::from_secs(DEFAULT_START_TIMEOUT_SECS),
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
        }
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Overall budget for [`App::start`].
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Overall budget for [`App::stop`].
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Register one handle and one lifecycle hook per provider.
    ///
    /// Opens no connections.
    pub fn build(self) -> DbResult<App<C>> {
        let mut registry = Registry::new();
        let mut lifecycle = Lifecycle::new();

        for module in self.modules {
            module.validate()?;
            let namespace = module.namespace().to_string();
            let providers = module.into_providers();
            info!(
                namespace = %namespace,
                clients = providers.len(),
                "Registering module"
            );

            for provider in &providers {
                let handle = ClientHandle::new(provider.tag(), provider.group().map(String::from));
                registry.insert(handle.clone())?;
                lifecycle.append(client_hook(Arc::clone(&self.connector), provider, handle));
            }
        }

        Ok(App {
            registry,
            lifecycle,
            start_timeout: self.start_timeout,
            stop_timeout: self.stop_timeout,
        })
    }
}

pub struct App<C: Connector> {
    registry: Registry<C::Client>,
    lifecycle: Lifecycle,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl App<DriverConnector> {
    pub fn builder() -> AppBuilder<DriverConnector> {
        AppBuilder::new()
    }
}

impl<C: Connector> App<C> {
    /// Connect and verify every client within the start timeout.
    pub async fn start(&mut self) -> DbResult<()> {
        let ctx = LifecycleContext::with_timeout(self.start_timeout);
        self.start_with(&ctx).await
    }

    pub async fn start_with(&mut self, ctx: &LifecycleContext) -> DbResult<()> {
        info!(clients = self.registry.len(), "Starting clients");
        self.lifecycle.start(ctx).await.inspect_err(|e| {
            error!(error = %e, "Startup aborted");
        })
    }

    /// Disconnect every started client within the stop timeout.
    pub async fn stop(&mut self) -> DbResult<()> {
        let ctx = LifecycleContext::with_timeout(self.stop_timeout);
        self.stop_with(&ctx).await
    }

    pub async fn stop_with(&mut self, ctx: &LifecycleContext) -> DbResult<()> {
        info!(clients = self.lifecycle.started_count(), "Stopping clients");
        self.lifecycle.stop(ctx).await
    }

    /// Start, wait for a shutdown signal, then stop.
    pub async fn run(mut self) -> DbResult<()> {
        self.start().await?;
        info!("Clients ready, waiting for shutdown signal");
        // Clients are stopped even if the signal handler could not be installed
        let waited = shutdown_signal().await;
        let stopped = self.stop().await;
        waited.and(stopped)
    }

    pub fn registry(&self) -> &Registry<C::Client> {
        &self.registry
    }

    pub fn get(&self, tag: &str) -> DbResult<&ClientHandle<C::Client>> {
        self.registry.get(tag)
    }

    pub fn resolve(&self, namespace: &str, name: &str) -> DbResult<&ClientHandle<C::Client>> {
        self.registry.resolve(namespace, name)
    }

    pub fn group(&self, namespace: &str) -> &[ClientHandle<C::Client>] {
        self.registry.group(namespace)
    }
}

impl<C: Connector> std::fmt::Debug for App<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("clients", &self.registry.tags().collect::<Vec<_>>())
            .field("started", &self.lifecycle.started_count())
            .field("start_timeout", &self.start_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .finish()
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() -> DbResult<()> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| DbError::internal(format!("Failed to install Ctrl+C handler: {}", e)))
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(|e| DbError::internal(format!("Failed to install signal handler: {}", e)))?
            .recv()
            .await;
        Ok::<(), DbError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<DbResult<()>>();

    tokio::select! {
        result = ctrl_c => {
            info!("Received SIGINT");
            result
        }
        result = terminate => {
            info!("Received SIGTERM");
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{with_connect_timeout, with_uris};

    #[test]
    fn test_build_registers_every_provider() {
        let app = App::builder()
            .module(Module::new(
                "mongo",
                [with_uris([
                    ("a", "mongodb://localhost:27017/dba"),
                    ("b", "mongodb://localhost:27017/dbb"),
                ])],
            ))
            .module(Module::simple("cache", "sqlite::memory:"))
            .build()
            .unwrap();

        assert_eq!(app.registry().len(), 3);
        assert_eq!(app.group("mongo").len(), 2);
        assert!(app.get("cache").unwrap().group().is_none());
        assert!(app.resolve("mongo", "b").is_ok());
    }

    #[test]
    fn test_empty_module_builds() {
        let app = App::builder()
            .module(Module::new("mongo", [with_connect_timeout(Duration::from_secs(1))]))
            .build()
            .unwrap();
        assert!(app.registry().is_empty());
        assert!(app.group("mongo").is_empty());
    }

    #[test]
    fn test_duplicate_tag_across_modules() {
        let result = App::builder()
            .module(Module::simple("db_a", "sqlite::memory:"))
            .module(Module::new("db", [with_uris([("a", "sqlite::memory:")])]))
            .build();
        assert!(matches!(result, Err(DbError::DuplicateTag { .. })));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let result = App::builder()
            .module(Module::simple("", "sqlite::memory:"))
            .build();
        assert!(matches!(result, Err(DbError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_start_with_unbounded_timeouts() {
        let mut app = App::builder()
            .module(Module::new(
                "db",
                [
                    with_uris([("a", "sqlite::memory:")]),
                    with_connect_timeout(Duration::MAX),
                ],
            ))
            .start_timeout(Duration::from_secs(u64::MAX))
            .stop_timeout(Duration::from_secs(u64::MAX))
            .build()
            .unwrap();

        app.start().await.unwrap();
        assert!(app.get("db_a").unwrap().is_ready().await);
        app.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_build_does_not_connect() {
        let app = App::builder()
            .module(Module::simple("cache", "sqlite::memory:"))
            .build()
            .unwrap();
        let handle = app.get("cache").unwrap();
        assert_eq!(handle.state().await, crate::models::ClientState::Unconnected);
    }
}
