//! Ordered start/stop hooks.
//!
//! Hooks start in registration order and stop in reverse order. A failed start
//! rolls back the hooks that already started; a failed stop never prevents the
//! remaining hooks from stopping.

pub mod context;
pub mod handle;
pub mod provider;

pub use context::LifecycleContext;
pub use handle::ClientHandle;
pub use provider::{client_hook, start_client, stop_client};

use crate::config::DEFAULT_STOP_TIMEOUT_SECS;
use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

type HookFn = Arc<dyn Fn(LifecycleContext) -> BoxFuture<'static, DbResult<()>> + Send + Sync>;

/// A named pair of start and stop callbacks.
#[derive(Clone)]
pub struct Hook {
    name: String,
    on_start: Option<HookFn>,
    on_stop: Option<HookFn>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_stop: None,
        }
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LifecycleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DbResult<()>> + Send + 'static,
    {
        self.on_start = Some(Arc::new(move |ctx| Box::pin(f(ctx))));
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LifecycleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DbResult<()>> + Send + 'static,
    {
        self.on_stop = Some(Arc::new(move |ctx| Box::pin(f(ctx))));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    hooks: Vec<Hook>,
    /// Hooks `[0, started)` have started and not yet stopped.
    started: usize,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn started_count(&self) -> usize {
        self.started
    }

    /// Run start hooks that have not started yet, in order.
    ///
    /// The first failure stops the sequence, stops every hook started so far in
    /// reverse order, and is returned as [`DbError::StartFailed`].
    pub async fn start(&mut self, ctx: &LifecycleContext) -> DbResult<()> {
        while self.started < self.hooks.len() {
            let hook = &self.hooks[self.started];
            let name = hook.name.clone();
            debug!(hook = %name, "Running start hook");

            let result = match &hook.on_start {
                Some(on_start) => on_start(ctx.child()).await,
                None => Ok(()),
            };

            if let Err(e) = result {
                error!(hook = %name, error = %e, "Start hook failed, rolling back");
                self.rollback().await;
                return Err(DbError::start_failed(name, e));
            }
            self.started += 1;
        }
        info!(hooks = self.started, "Lifecycle started");
        Ok(())
    }

    /// Run stop hooks of started hooks in reverse order.
    ///
    /// Every hook runs regardless of earlier failures; failures are returned
    /// together as [`DbError::Shutdown`].
    pub async fn stop(&mut self, ctx: &LifecycleContext) -> DbResult<()> {
        let mut failures = Vec::new();
        while self.started > 0 {
            self.started -= 1;
            let hook = &self.hooks[self.started];
            let Some(on_stop) = &hook.on_stop else {
                continue;
            };
            debug!(hook = %hook.name, "Running stop hook");
            if let Err(e) = on_stop(ctx.child()).await {
                warn!(hook = %hook.name, error = %e, "Stop hook failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            info!("Lifecycle stopped");
            Ok(())
        } else {
            Err(DbError::Shutdown { failures })
        }
    }

    /// Stop what already started with a fresh budget; the start context may
    /// already be past its deadline.
    async fn rollback(&mut self) {
        let ctx = LifecycleContext::with_timeout(Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS));
        if let Err(e) = self.stop(&ctx).await {
            warn!(error = %e, "Rollback did not complete cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_hook(name: &str, log: Arc<Mutex<Vec<String>>>, fail_start: bool) -> Hook {
        let start_log = Arc::clone(&log);
        let start_name = name.to_string();
        let stop_name = name.to_string();
        Hook::new(name)
            .on_start(move |_ctx| {
                let log = Arc::clone(&start_log);
                let name = start_name.clone();
                async move {
                    log.lock().unwrap().push(format!("start {}", name));
                    if fail_start {
                        Err(DbError::internal("boom"))
                    } else {
                        Ok(())
                    }
                }
            })
            .on_stop(move |_ctx| {
                let log = Arc::clone(&log);
                let name = stop_name.clone();
                async move {
                    log.lock().unwrap().push(format!("stop {}", name));
                    Ok(())
                }
            })
    }

    #[tokio::test]
    async fn test_start_in_order_stop_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.append(recording_hook("a", Arc::clone(&log), false));
        lifecycle.append(recording_hook("b", Arc::clone(&log), false));

        let ctx = LifecycleContext::new();
        lifecycle.start(&ctx).await.unwrap();
        assert_eq!(lifecycle.started_count(), 2);
        lifecycle.stop(&ctx).await.unwrap();
        assert_eq!(lifecycle.started_count(), 0);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "start b", "stop b", "stop a"]
        );
    }

    #[tokio::test]
    async fn test_failed_start_rolls_back() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.append(recording_hook("a", Arc::clone(&log), false));
        lifecycle.append(recording_hook("b", Arc::clone(&log), true));
        lifecycle.append(recording_hook("c", Arc::clone(&log), false));

        let err = lifecycle.start(&LifecycleContext::new()).await.unwrap_err();
        assert!(matches!(err, DbError::StartFailed { ref hook, .. } if hook == "b"));
        assert_eq!(lifecycle.started_count(), 0);
        assert_eq!(*log.lock().unwrap(), vec!["start a", "start b", "stop a"]);
    }

    #[tokio::test]
    async fn test_stop_continues_after_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.append(recording_hook("a", Arc::clone(&log), false));
        lifecycle.append(
            Hook::new("broken")
                .on_start(|_ctx| async { Ok(()) })
                .on_stop(|_ctx| async { Err(DbError::internal("cannot close")) }),
        );
        lifecycle.append(recording_hook("c", Arc::clone(&log), false));

        let ctx = LifecycleContext::new();
        lifecycle.start(&ctx).await.unwrap();
        let err = lifecycle.stop(&ctx).await.unwrap_err();
        match err {
            DbError::Shutdown { failures } => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "start c", "stop c", "stop a"]
        );
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();
        lifecycle.append(recording_hook("a", Arc::clone(&log), false));
        lifecycle.stop(&LifecycleContext::new()).await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_lifecycle() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.is_empty());
        lifecycle.start(&LifecycleContext::new()).await.unwrap();
        lifecycle.stop(&LifecycleContext::new()).await.unwrap();
    }
}
