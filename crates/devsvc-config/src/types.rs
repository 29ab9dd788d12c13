use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Key of the core-metadata dependency in [`Config::clients`].
pub const CLIENT_METADATA: &str = "metadata";
/// Key of the core-data dependency in [`Config::clients`].
pub const CLIENT_DATA: &str = "data";

/// Dependencies that must be configured and healthy before the service starts.
pub const REQUIRED_CLIENTS: [&str; 2] = [CLIENT_DATA, CLIENT_METADATA];

/// How dependency health is discovered. Read once at startup and applied to
/// every dependency.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// GET the dependency's ping endpoint directly.
    #[default]
    Direct,
    /// Ask the service registry for the dependency's aggregated health.
    Registry,
}

impl DiscoveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Registry => "registry",
        }
    }

    pub fn uses_registry(&self) -> bool {
        matches!(self, Self::Registry)
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscoveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "registry" => Ok(Self::Registry),
            other => Err(format!("unknown discovery mode {other:?}")),
        }
    }
}

/// Identity of this process and its own status surface.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Port of the `/healthz`, `/readyz` and `/metrics` server.
    #[serde(default = "default_status_port")]
    pub status_port: u16,
}

/// Address of the service registry (Consul).
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default = "default_registry_host")]
    pub host: String,
    #[serde(default = "default_registry_port")]
    pub port: u16,
    /// Bound on every registry call, TCP pre-check included, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

impl RegistryConfig {
    /// `host:port`, suitable for a TCP connect.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `http://host:port`, the registry's HTTP API root.
    pub fn address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

/// One dependency service the device service talks to.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Service identifier in the registry catalog.
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
}

impl ClientConfig {
    /// `protocol://host:port`
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

/// Where log lines go. Without a file, logs are written to stdout.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Retry cadence of the bootstrap loops.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessConfig {
    /// Fixed delay between dependency health checks, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Fixed delay between post-initialization list calls, in milliseconds.
    #[serde(default = "default_verify_interval_ms")]
    pub verify_interval_ms: u64,
}

impl ReadinessConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn verify_interval(&self) -> Duration {
        Duration::from_millis(self.verify_interval_ms)
    }
}

/// Top-level configuration document.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub service: ServiceInfo,
    #[serde(default)]
    pub discovery: DiscoveryMode,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default = "default_clients")]
    pub clients: BTreeMap<String, ClientConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

impl Config {
    /// Look up a configured dependency by key (`metadata`, `data`).
    pub fn client(&self, key: &str) -> Option<&ClientConfig> {
        self.clients.get(key)
    }
}
