//! Module builder.
//!
//! A [`Module`] is the registration unit for one namespace: a list of client
//! providers, each carrying the tag it is resolved by and the group it joins.
//! Building a module never opens a connection; clients connect when the
//! [`App`](crate::app::App) they are registered with starts.
//!
//! ```no_run
//! use db_modules::module::{Module, with_connect_timeout, with_uris};
//! use std::time::Duration;
//!
//! let module = Module::new(
//!     "mongo",
//!     [
//!         with_uris([
//!             ("clienta", "mongodb://localhost:27017/dba"),
//!             ("clientb", "mongodb://localhost:27017/dbb"),
//!         ]),
//!         with_connect_timeout(Duration::from_secs(5)),
//!     ],
//! );
//! assert_eq!(module.providers()[0].tag(), "mongo_clienta");
//! ```

pub mod options;

pub use options::{
    ModuleConfig, ModuleOption, with_client, with_connect_timeout, with_timeouts, with_uris,
};

use crate::config::validate_name;
use crate::error::{DbError, DbResult};
use crate::models::{ClientOptions, ClientSpec, TimeoutConfig};

/// Tag of a client registered by a multi-client module.
pub fn client_tag(namespace: &str, name: &str) -> String {
    format!("{}_{}", namespace, name)
}

/// Registration entry for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProvider {
    tag: String,
    group: Option<String>,
    spec: ClientSpec,
    timeouts: TimeoutConfig,
}

impl ClientProvider {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn spec(&self) -> &ClientSpec {
        &self.spec
    }

    pub fn options(&self) -> &ClientOptions {
        &self.spec.options
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }
}

/// Registration unit for the clients of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    namespace: String,
    providers: Vec<ClientProvider>,
}

impl Module {
    /// Single client tagged exactly `namespace`, in no group.
    pub fn simple(namespace: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::simple_with_timeouts(namespace, uri, TimeoutConfig::default())
    }

    pub fn simple_with_timeouts(
        namespace: impl Into<String>,
        uri: impl Into<String>,
        timeouts: TimeoutConfig,
    ) -> Self {
        let namespace = namespace.into();
        let provider = ClientProvider {
            tag: namespace.clone(),
            group: None,
            spec: ClientSpec::new(namespace.clone(), ClientOptions::from_uri(uri)),
            timeouts,
        };
        Self {
            namespace,
            providers: vec![provider],
        }
    }

    /// One client per configured name, tagged `<namespace>_<name>` and grouped
    /// under `<namespace>`.
    ///
    /// No options, or options that configure no client, give an empty module.
    pub fn new(
        namespace: impl Into<String>,
        options: impl IntoIterator<Item = ModuleOption>,
    ) -> Self {
        Self::from_config(namespace, ModuleConfig::apply(options))
    }

    pub fn from_config(namespace: impl Into<String>, config: ModuleConfig) -> Self {
        let namespace = namespace.into();
        let (clients, timeouts) = config.into_parts();
        let providers = clients
            .into_iter()
            .map(|(name, options)| ClientProvider {
                tag: client_tag(&namespace, &name),
                group: Some(namespace.clone()),
                spec: ClientSpec::new(name, options),
                timeouts,
            })
            .collect();
        Self {
            namespace,
            providers,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn providers(&self) -> &[ClientProvider] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Check names before the module is registered.
    pub fn validate(&self) -> DbResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(DbError::invalid_input("Module namespace cannot be empty"));
        }
        for provider in &self.providers {
            validate_name(&provider.spec.name).map_err(|message| {
                DbError::invalid_input(format!("{} (namespace '{}')", message, self.namespace))
            })?;
        }
        Ok(())
    }

    pub(crate) fn into_providers(self) -> Vec<ClientProvider> {
        self.providers
    }
}
