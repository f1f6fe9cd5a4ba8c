//! Start and stop hooks for one registered client.
//!
//! Per client the handle moves
//! `Unconnected → Connecting → Verifying → Ready → Disconnecting → Closed`,
//! or ends in `Failed` when connect or verification does not succeed. Nothing
//! connects before the start hook runs.

use crate::db::Connector;
use crate::error::{DbError, DbResult};
use crate::lifecycle::{ClientHandle, Hook, LifecycleContext};
use crate::models::{ClientOptions, ClientState, TimeoutConfig};
use crate::module::ClientProvider;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Build the lifecycle hook for `provider`, driving `handle`.
pub fn client_hook<C: Connector>(
    connector: Arc<C>,
    provider: &ClientProvider,
    handle: ClientHandle<C::Client>,
) -> Hook {
    let options = Arc::new(provider.options().clone());
    let timeouts = provider.timeouts();
    let start_connector = Arc::clone(&connector);
    let start_handle = handle.clone();

    Hook::new(handle.tag())
        .on_start(move |ctx| {
            let connector = Arc::clone(&start_connector);
            let handle = start_handle.clone();
            let options = Arc::clone(&options);
            async move { start_client(connector.as_ref(), &handle, &options, timeouts, &ctx).await }
        })
        .on_stop(move |ctx| {
            let connector = Arc::clone(&connector);
            let handle = handle.clone();
            async move { stop_client(connector.as_ref(), &handle, &ctx).await }
        })
}

/// Connect within `timeouts.connect`, then ping within `timeouts.ping`.
///
/// On verification failure the opened client is closed again, bounded by the
/// ping budget, and the handle ends `Failed`.
pub async fn start_client<C: Connector>(
    connector: &C,
    handle: &ClientHandle<C::Client>,
    options: &ClientOptions,
    timeouts: TimeoutConfig,
    ctx: &LifecycleContext,
) -> DbResult<()> {
    let tag = handle.tag();

    handle.set_state(ClientState::Connecting).await;
    info!(
        tag = %tag,
        uri = %options.masked_uri(),
        timeout_ms = timeouts.connect.as_millis(),
        "Connecting client"
    );

    let connect = ctx
        .run(
            &format!("connect {}", tag),
            Some(timeouts.connect),
            connector.connect(options),
        )
        .await;
    let client = match connect {
        Ok(client) => client,
        Err(e) => {
            handle.set_state(ClientState::Failed).await;
            error!(tag = %tag, error = %e, "Client failed to connect");
            return Err(DbError::connect_failed(tag, e));
        }
    };

    handle.attach(client.clone(), ClientState::Verifying).await;
    debug!(
        tag = %tag,
        timeout_ms = timeouts.ping.as_millis(),
        "Verifying client"
    );

    let verify = ctx
        .run(
            &format!("ping {}", tag),
            Some(timeouts.ping),
            connector.ping(&client),
        )
        .await;
    if let Err(e) = verify {
        error!(tag = %tag, error = %e, "Client failed verification");
        if let Some(client) = handle.detach(ClientState::Failed).await {
            match tokio::time::timeout(timeouts.ping, connector.disconnect(&client)).await {
                Ok(Ok(())) => debug!(tag = %tag, "Closed unverified client"),
                Ok(Err(close_err)) => {
                    warn!(tag = %tag, error = %close_err, "Failed to close unverified client")
                }
                Err(_) => warn!(tag = %tag, "Timed out closing unverified client"),
            }
        }
        return Err(DbError::verification_failed(tag, e));
    }

    handle.set_state(ClientState::Ready).await;
    info!(tag = %tag, "Client ready");
    Ok(())
}

/// Disconnect a Ready client using only the caller's context for bounds.
///
/// Clients that never became ready have nothing to close.
pub async fn stop_client<C: Connector>(
    connector: &C,
    handle: &ClientHandle<C::Client>,
    ctx: &LifecycleContext,
) -> DbResult<()> {
    let tag = handle.tag();
    let Some(client) = handle.begin_disconnect().await else {
        debug!(tag = %tag, "Client not ready, nothing to disconnect");
        return Ok(());
    };

    info!(tag = %tag, "Disconnecting client");
    let result = ctx
        .run(
            &format!("disconnect {}", tag),
            None,
            connector.disconnect(&client),
        )
        .await;
    handle.set_state(ClientState::Closed).await;

    match result {
        Ok(()) => {
            info!(tag = %tag, "Client closed");
            Ok(())
        }
        Err(e) => {
            warn!(tag = %tag, error = %e, "Client failed to disconnect cleanly");
            Err(DbError::disconnect_failed(tag, e))
        }
    }
}
