use std::path::{Path, PathBuf};

use url::Url;

use crate::types::*;

pub const ENV_DISCOVERY: &str = "DEVSVC_DISCOVERY";
pub const ENV_REGISTRY_HOST: &str = "DEVSVC_REGISTRY_HOST";
pub const ENV_REGISTRY_PORT: &str = "DEVSVC_REGISTRY_PORT";
pub const ENV_LOG_FILE: &str = "DEVSVC_LOG_FILE";

/// Every variable [`Config::apply_env_overrides`] reads.
pub const ENV_OVERRIDES: [&str; 4] = [
    ENV_DISCOVERY,
    ENV_REGISTRY_HOST,
    ENV_REGISTRY_PORT,
    ENV_LOG_FILE,
];

/// The overrides present in the environment, as `(name, value)` pairs.
///
/// Loading happens before logging is set up, so callers report these once
/// the subscriber is installed.
pub fn active_env_overrides() -> Vec<(&'static str, String)> {
    ENV_OVERRIDES
        .into_iter()
        .filter_map(|name| std::env::var(name).ok().map(|value| (name, value)))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The configuration can never work, no matter how long we wait.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Parse a YAML document. Missing sections take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read the file at `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&raw)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DEVSVC_*` environment variables on top of the file contents.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(mode) = std::env::var(ENV_DISCOVERY) {
            self.discovery = mode.parse().map_err(ConfigError::Invalid)?;
        }
        if let Ok(host) = std::env::var(ENV_REGISTRY_HOST) {
            self.registry.host = host;
        }
        if let Ok(port) = std::env::var(ENV_REGISTRY_PORT) {
            self.registry.port = port.parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_REGISTRY_PORT} is not a port: {port:?}"))
            })?;
        }
        if let Ok(file) = std::env::var(ENV_LOG_FILE) {
            self.logging.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }
        Ok(())
    }

    /// Reject configurations that no amount of retrying could fix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.uses_registry() {
            if self.registry.host.trim().is_empty() {
                return Err(invalid("registry.host is empty but discovery is registry"));
            }
            if self.registry.port == 0 {
                return Err(invalid("registry.port must not be 0"));
            }
            if self.registry.timeout == 0 {
                return Err(invalid("registry.timeout must be greater than 0"));
            }
            let address = self.registry.address();
            let url = Url::parse(&address).map_err(|e| {
                ConfigError::Invalid(format!("registry address {address} is not a valid URL: {e}"))
            })?;
            if !authority_matches(&url, &self.registry.host, self.registry.port) {
                return Err(ConfigError::Invalid(format!(
                    "registry.host {:?} is not a plain host name or address",
                    self.registry.host
                )));
            }
        }

        for key in REQUIRED_CLIENTS {
            let Some(client) = self.clients.get(key) else {
                return Err(ConfigError::Invalid(format!("clients.{key} is missing")));
            };
            self.validate_client(key, client)?;
        }

        if self.readiness.retry_interval_ms == 0 {
            return Err(invalid("readiness.retryIntervalMs must be greater than 0"));
        }
        if self.readiness.verify_interval_ms == 0 {
            return Err(invalid("readiness.verifyIntervalMs must be greater than 0"));
        }
        Ok(())
    }

    fn validate_client(&self, key: &str, client: &ClientConfig) -> Result<(), ConfigError> {
        let fail = |what: &str| ConfigError::Invalid(format!("clients.{key}: {what}"));

        if client.host.trim().is_empty() {
            return Err(fail("host is empty"));
        }
        if client.port == 0 {
            return Err(fail("port must not be 0"));
        }
        if client.timeout == 0 {
            return Err(fail("timeout must be greater than 0"));
        }
        if !matches!(client.protocol.as_str(), "http" | "https") {
            return Err(fail(&format!("unsupported protocol {:?}", client.protocol)));
        }
        if self.discovery.uses_registry() && client.name.trim().is_empty() {
            return Err(fail("name is required for registry discovery"));
        }
        let address = client.address();
        let url = Url::parse(&address)
            .map_err(|e| fail(&format!("address {address} is not a valid URL: {e}")))?;
        if !authority_matches(&url, &client.host, client.port) {
            return Err(fail(&format!(
                "host {:?} is not a plain host name or address",
                client.host
            )));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}

/// `http://a/b:48081` parses, with host `a` and the rest as a path. Only
/// accept a URL whose host and port are exactly the configured ones.
fn authority_matches(url: &Url, host: &str, port: u16) -> bool {
    url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(host))
        && url.port_or_known_default() == Some(port)
}
