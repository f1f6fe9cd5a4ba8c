//! Typed registry of client handles.
//!
//! Handles are resolved by tag (`<namespace>` for simple modules,
//! `<namespace>_<name>` otherwise) or collectively by group (`<namespace>`).

use crate::error::{DbError, DbResult};
use crate::lifecycle::ClientHandle;
use crate::models::ClientSummary;
use crate::module::client_tag;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Registry<T> {
    tagged: HashMap<String, ClientHandle<T>>,
    groups: HashMap<String, Vec<ClientHandle<T>>>,
    /// Tags in registration order.
    order: Vec<String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            tagged: HashMap::new(),
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Clone> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under its tag and, if it has one, its group.
    pub fn insert(&mut self, handle: ClientHandle<T>) -> DbResult<()> {
        let tag = handle.tag().to_string();
        if self.tagged.contains_key(&tag) {
            return Err(DbError::duplicate_tag(tag));
        }
        if let Some(group) = handle.group() {
            self.groups
                .entry(group.to_string())
                .or_default()
                .push(handle.clone());
        }
        self.order.push(tag.clone());
        self.tagged.insert(tag, handle);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> DbResult<&ClientHandle<T>> {
        self.tagged
            .get(tag)
            .ok_or_else(|| DbError::client_not_found(tag))
    }

    /// Resolve the client `name` of a multi-client module.
    pub fn resolve(&self, namespace: &str, name: &str) -> DbResult<&ClientHandle<T>> {
        self.get(&client_tag(namespace, name))
    }

    /// All handles of a group in registration order; empty for unknown groups.
    pub fn group(&self, namespace: &str) -> &[ClientHandle<T>] {
        self.groups
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tagged.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn handles(&self) -> impl Iterator<Item = &ClientHandle<T>> {
        self.order.iter().filter_map(|tag| self.tagged.get(tag))
    }

    pub fn len(&self) -> usize {
        self.tagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tagged.is_empty()
    }

    /// Tag, group and state of every client in registration order.
    pub async fn summaries(&self) -> Vec<ClientSummary> {
        let mut summaries = Vec::with_capacity(self.len());
        for handle in self.handles() {
            summaries.push(ClientSummary {
                tag: handle.tag().to_string(),
                group: handle.group().map(String::from),
                state: handle.state().await,
            });
        }
        summaries
    }
}
