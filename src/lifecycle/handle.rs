//! Shared handle to a registered client.

use crate::error::{DbError, DbResult};
use crate::models::ClientState;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Slot<T> {
    state: ClientState,
    client: Option<T>,
}

#[derive(Debug)]
struct Inner<T> {
    tag: String,
    group: Option<String>,
    slot: RwLock<Slot<T>>,
}

/// Handle to one client, cheap to clone.
///
/// The registry owns one per registered client. The client inside is only
/// handed out while the handle is [`ClientState::Ready`].
#[derive(Debug)]
pub struct ClientHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ClientHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> ClientHandle<T> {
    pub fn new(tag: impl Into<String>, group: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                tag: tag.into(),
                group,
                slot: RwLock::new(Slot {
                    state: ClientState::Unconnected,
                    client: None,
                }),
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn group(&self) -> Option<&str> {
        self.inner.group.as_deref()
    }

    pub async fn state(&self) -> ClientState {
        self.inner.slot.read().await.state
    }

    pub async fn is_ready(&self) -> bool {
        self.state().await.is_ready()
    }

    /// The live client, or [`DbError::NotReady`] outside the Ready state.
    pub async fn client(&self) -> DbResult<T> {
        let slot = self.inner.slot.read().await;
        match (&slot.state, &slot.client) {
            (ClientState::Ready, Some(client)) => Ok(client.clone()),
            (state, _) => Err(DbError::not_ready(self.tag(), *state)),
        }
    }

    /// True when both handles point at the same registered client.
    pub fn same_client(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn set_state(&self, state: ClientState) {
        self.inner.slot.write().await.state = state;
    }

    /// Store a freshly connected client and move to `state`.
    pub(crate) async fn attach(&self, client: T, state: ClientState) {
        let mut slot = self.inner.slot.write().await;
        slot.client = Some(client);
        slot.state = state;
    }

    /// Take the client out, moving to `state`.
    pub(crate) async fn detach(&self, state: ClientState) -> Option<T> {
        let mut slot = self.inner.slot.write().await;
        slot.state = state;
        slot.client.take()
    }

    /// Take the client out only if it is Ready, marking it Disconnecting.
    pub(crate) async fn begin_disconnect(&self) -> Option<T> {
        let mut slot = self.inner.slot.write().await;
        if slot.state != ClientState::Ready {
            return None;
        }
        slot.state = ClientState::Disconnecting;
        slot.client.take()
    }
}
