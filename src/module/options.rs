//! Module configuration and the option functions that build it.
//!
//! Options are applied in order over one accumulator. Writing the same client
//! name twice keeps the last write.

use crate::models::{ClientOptions, TimeoutConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Name → client options for one namespace, plus the timeouts shared by all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleConfig {
    clients: BTreeMap<String, ClientOptions>,
    timeouts: TimeoutConfig,
}

impl ModuleConfig {
    /// Empty configuration seeded with default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold options over a fresh accumulator.
    pub fn apply(options: impl IntoIterator<Item = ModuleOption>) -> Self {
        let mut config = Self::new();
        for option in options {
            option.apply_to(&mut config);
        }
        config
    }

    /// Insert or replace the options for `name`.
    pub fn insert(&mut self, name: impl Into<String>, options: ClientOptions) {
        let name = name.into();
        if self.clients.insert(name.clone(), options).is_some() {
            debug!(client = %name, "Client options replaced by a later option");
        }
    }

    pub fn set_timeouts(&mut self, timeouts: TimeoutConfig) {
        self.timeouts = timeouts;
    }

    pub fn get(&self, name: &str) -> Option<&ClientOptions> {
        self.clients.get(name)
    }

    /// Clients in name order.
    pub fn clients(&self) -> impl Iterator<Item = (&str, &ClientOptions)> {
        self.clients.iter().map(|(name, opts)| (name.as_str(), opts))
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<String, ClientOptions>, TimeoutConfig) {
        (self.clients, self.timeouts)
    }
}

/// A single configuration step applied to a [`ModuleConfig`].
pub struct ModuleOption(Box<dyn FnOnce(&mut ModuleConfig) + Send>);

impl ModuleOption {
    /// Wrap an arbitrary configuration step.
    pub fn new(f: impl FnOnce(&mut ModuleConfig) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn apply_to(self, config: &mut ModuleConfig) {
        (self.0)(config)
    }
}

impl fmt::Debug for ModuleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleOption(..)")
    }
}

/// One client per entry, options built from the raw URI.
///
/// Accepts any map-like source so values from a configuration library plug in
/// directly.
pub fn with_uris<I, K, V>(uris: I) -> ModuleOption
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let entries: Vec<(String, String)> = uris
        .into_iter()
        .map(|(name, uri)| (name.into(), uri.into()))
        .collect();
    ModuleOption::new(move |config| {
        for (name, uri) in entries {
            config.insert(name, ClientOptions::from_uri(uri));
        }
    })
}

/// One client from pre-built options, for settings a URI cannot express.
pub fn with_client(name: impl Into<String>, options: ClientOptions) -> ModuleOption {
    let name = name.into();
    ModuleOption::new(move |config| config.insert(name, options))
}

/// Split `total` evenly between the connect and ping phases of every client.
pub fn with_connect_timeout(total: Duration) -> ModuleOption {
    ModuleOption::new(move |config| config.set_timeouts(TimeoutConfig::split(total)))
}

pub fn with_timeouts(timeouts: TimeoutConfig) -> ModuleOption {
    ModuleOption::new(move |config| config.set_timeouts(timeouts))
}
