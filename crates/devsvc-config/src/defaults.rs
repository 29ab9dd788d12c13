use std::collections::BTreeMap;

use super::types::*;

pub(crate) fn default_service_name() -> String {
    "device-service".to_string()
}

pub(crate) fn default_status_port() -> u16 {
    49990
}

pub(crate) fn default_registry_host() -> String {
    "localhost".to_string()
}

pub(crate) fn default_registry_port() -> u16 {
    8500
}

pub(crate) fn default_protocol() -> String {
    "http".to_string()
}

pub(crate) fn default_timeout_ms() -> u64 {
    5000
}

pub(crate) fn default_retry_interval_ms() -> u64 {
    10_000
}

pub(crate) fn default_verify_interval_ms() -> u64 {
    2_000
}

/// The two core services every device service depends on, on their
/// well-known local ports.
pub(crate) fn default_clients() -> BTreeMap<String, ClientConfig> {
    BTreeMap::from([
        (
            CLIENT_DATA.to_string(),
            local_client("edgex-core-data", 48080),
        ),
        (
            CLIENT_METADATA.to_string(),
            local_client("edgex-core-metadata", 48081),
        ),
    ])
}

fn local_client(name: &str, port: u16) -> ClientConfig {
    ClientConfig {
        name: name.to_string(),
        host: "localhost".to_string(),
        port,
        protocol: default_protocol(),
        timeout: default_timeout_ms(),
    }
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            status_port: default_status_port(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: default_registry_host(),
            port: default_registry_port(),
            timeout: default_timeout_ms(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            verify_interval_ms: default_verify_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceInfo::default(),
            discovery: DiscoveryMode::default(),
            registry: RegistryConfig::default(),
            clients: default_clients(),
            logging: LoggingConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}
