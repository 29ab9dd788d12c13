use std::time::Duration;

use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::debug;

use crate::client::{ApiError, HttpClient};

pub const HEALTH_PASSING: &str = "passing";
pub const HEALTH_WARNING: &str = "warning";
pub const HEALTH_CRITICAL: &str = "critical";
pub const HEALTH_MAINTENANCE: &str = "maintenance";

const NODE_MAINTENANCE_CHECK: &str = "_node_maintenance";
const SERVICE_MAINTENANCE_PREFIX: &str = "_service_maintenance:";

/// Client for the Consul v1 HTTP API.
///
/// Only the two read endpoints the bootstrap needs are wrapped: the catalog
/// lookup and the per-service health checks.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
}

// --- Response types ---

/// One registered instance from `GET /v1/catalog/service/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogService {
    #[serde(default)]
    pub node: String,
    /// Address of the node the instance runs on.
    #[serde(default)]
    pub address: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    /// Address the instance registered with; empty means "use the node address".
    #[serde(default)]
    pub service_address: String,
    #[serde(default)]
    pub service_port: u16,
}

impl CatalogService {
    /// `host:port` clients should dial for this instance.
    pub fn host_port(&self) -> String {
        let host = if self.service_address.is_empty() {
            &self.address
        } else {
            &self.service_address
        };
        format!("{host}:{}", self.service_port)
    }
}

/// One check from `GET /v1/health/checks/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheckEntry {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub output: String,
}

impl RegistryClient {
    /// `address` is the registry root (e.g. `http://consul:8500`). Every
    /// query fails with [`ApiError::Timeout`] once `timeout` has passed.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, ApiError> {
        let url = format!("{}/v1/", address.trim_end_matches('/'));
        Ok(Self {
            http: HttpClient::new(&url, Some(timeout))?,
        })
    }

    /// Open a TCP connection to `socket_addr` and close it straight away.
    ///
    /// Cheap pre-check before building a client and issuing queries. A
    /// connect that takes longer than `timeout` counts as unreachable.
    pub async fn is_reachable(socket_addr: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                debug!(addr = %socket_addr, error = %e, "registry TCP connect failed");
                false
            }
            Err(_) => {
                debug!(addr = %socket_addr, timeout_ms = timeout.as_millis() as u64, "registry TCP connect timed out");
                false
            }
        }
    }

    /// GET `/v1/catalog/service/{id}`
    pub async fn catalog_service(&self, service_id: &str) -> Result<Vec<CatalogService>, ApiError> {
        self.http.get(&format!("catalog/service/{service_id}")).await
    }

    /// GET `/v1/health/checks/{id}`
    pub async fn health_checks(&self, service_id: &str) -> Result<Vec<HealthCheckEntry>, ApiError> {
        self.http.get(&format!("health/checks/{service_id}")).await
    }

    /// `host:port` of the first registered instance of `service_id`, if any.
    pub async fn resolve_instance(&self, service_id: &str) -> Result<Option<String>, ApiError> {
        let instances = self.catalog_service(service_id).await?;
        Ok(instances.first().map(CatalogService::host_port))
    }

    pub fn base_url(&self) -> &url::Url {
        self.http.base_url()
    }
}

/// Collapse a service's checks into a single status, the way Consul does.
///
/// Maintenance wins over critical, critical over warning, warning over
/// passing. No checks at all counts as passing. An unrecognised status
/// makes the whole result the empty string.
pub fn aggregated_status(checks: &[HealthCheckEntry]) -> String {
    let (mut warning, mut critical, mut maintenance) = (false, false, false);

    for check in checks {
        if check.check_id == NODE_MAINTENANCE_CHECK
            || check.check_id.starts_with(SERVICE_MAINTENANCE_PREFIX)
        {
            maintenance = true;
            continue;
        }
        match check.status.as_str() {
            HEALTH_PASSING => {}
            HEALTH_WARNING => warning = true,
            HEALTH_CRITICAL => critical = true,
            _ => return String::new(),
        }
    }

    let status = if maintenance {
        HEALTH_MAINTENANCE
    } else if critical {
        HEALTH_CRITICAL
    } else if warning {
        HEALTH_WARNING
    } else {
        HEALTH_PASSING
    };
    status.to_string()
}
