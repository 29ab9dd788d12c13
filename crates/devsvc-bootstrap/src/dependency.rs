use std::time::Duration;

use devsvc_config::{ClientConfig, Config, REQUIRED_CLIENTS};

/// A service that must be healthy before the device service may start.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Configuration key, e.g. `metadata`.
    pub key: String,
    pub client: ClientConfig,
}

impl Dependency {
    pub fn new(key: impl Into<String>, client: ClientConfig) -> Self {
        Self {
            key: key.into(),
            client,
        }
    }

    /// The required dependencies of `config`, in a stable order.
    ///
    /// Call only on validated configuration; keys without a client entry are
    /// skipped.
    pub fn required(config: &Config) -> Vec<Self> {
        REQUIRED_CLIENTS
            .iter()
            .filter_map(|key| config.client(key).map(|c| Self::new(*key, c.clone())))
            .collect()
    }

    /// Identifier of the service in the registry catalog.
    pub fn service_id(&self) -> &str {
        &self.client.name
    }

    /// `protocol://host:port`
    pub fn address(&self) -> String {
        self.client.address()
    }

    pub fn timeout(&self) -> Duration {
        self.client.timeout()
    }
}
