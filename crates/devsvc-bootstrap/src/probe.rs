//! One-shot health checks against a dependency, either by pinging it
//! directly or by asking the service registry.

use std::future::Future;

use devsvc_api::{
    ApiError, CatalogService, HEALTH_PASSING, HealthCheckEntry, PingClient, RegistryClient,
    aggregated_status,
};
use devsvc_config::{Config, DiscoveryMode, RegistryConfig};
use tracing::info;

use crate::dependency::Dependency;
use crate::error::ProbeError;

/// A single health check of one dependency. `Ok(())` means healthy.
pub trait Probe: Send + Sync {
    fn check(
        &self,
        dependency: &Dependency,
    ) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// The health checker for the configured discovery mode, chosen once when
/// the bootstrap context is built.
#[derive(Debug, Clone)]
pub enum HealthChecker {
    Direct(DirectProbe),
    Registry(RegistryProbe<ConsulGateway>),
}

impl HealthChecker {
    pub fn for_config(config: &Config) -> Self {
        match config.discovery {
            DiscoveryMode::Direct => Self::Direct(DirectProbe),
            DiscoveryMode::Registry => {
                Self::Registry(RegistryProbe::new(ConsulGateway::new(config.registry.clone())))
            }
        }
    }

    pub fn mode(&self) -> DiscoveryMode {
        match self {
            Self::Direct(_) => DiscoveryMode::Direct,
            Self::Registry(_) => DiscoveryMode::Registry,
        }
    }
}

impl Probe for HealthChecker {
    async fn check(&self, dependency: &Dependency) -> Result<(), ProbeError> {
        match self {
            Self::Direct(probe) => probe.check(dependency).await,
            Self::Registry(probe) => probe.check(dependency).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Direct ping
// ---------------------------------------------------------------------------

/// Pings `GET /api/v1/ping` on the dependency, bounded by its timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectProbe;

impl DirectProbe {
    pub async fn check_direct(&self, dependency: &Dependency) -> Result<(), ProbeError> {
        info!(dependency = %dependency.key, "checking service status");

        let unreachable = |source: ApiError| {
            if source.is_timeout() {
                ProbeError::TransportTimeout {
                    dependency: dependency.key.clone(),
                    source,
                }
            } else {
                ProbeError::TransportUnreachable {
                    dependency: dependency.key.clone(),
                    source,
                }
            }
        };

        let client = PingClient::new(&dependency.address(), dependency.timeout())
            .map_err(unreachable)?;
        client.ping().await.map_err(unreachable)
    }
}

impl Probe for DirectProbe {
    async fn check(&self, dependency: &Dependency) -> Result<(), ProbeError> {
        self.check_direct(dependency).await
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Connectivity to the service registry.
pub trait RegistryGateway: Send + Sync {
    type Connection: RegistryConnection;

    /// Address used in log lines and errors.
    fn address(&self) -> String;

    /// Transport-level probe: connect and immediately close.
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;

    /// A fresh connection for this check cycle. Never cached.
    fn new_connection(&self) -> Result<Self::Connection, ProbeError>;
}

/// The two registry queries a health check needs.
pub trait RegistryConnection: Send + Sync {
    fn catalog_service(
        &self,
        service_id: &str,
    ) -> impl Future<Output = Result<Vec<CatalogService>, ApiError>> + Send;

    fn health_checks(
        &self,
        service_id: &str,
    ) -> impl Future<Output = Result<Vec<HealthCheckEntry>, ApiError>> + Send;
}

impl RegistryConnection for RegistryClient {
    async fn catalog_service(&self, service_id: &str) -> Result<Vec<CatalogService>, ApiError> {
        RegistryClient::catalog_service(self, service_id).await
    }

    async fn health_checks(&self, service_id: &str) -> Result<Vec<HealthCheckEntry>, ApiError> {
        RegistryClient::health_checks(self, service_id).await
    }
}

/// [`RegistryGateway`] backed by a Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulGateway {
    registry: RegistryConfig,
}

impl ConsulGateway {
    pub fn new(registry: RegistryConfig) -> Self {
        Self { registry }
    }
}

impl RegistryGateway for ConsulGateway {
    type Connection = RegistryClient;

    fn address(&self) -> String {
        self.registry.socket_addr()
    }

    async fn is_reachable(&self) -> bool {
        RegistryClient::is_reachable(&self.registry.socket_addr(), self.registry.timeout()).await
    }

    fn new_connection(&self) -> Result<RegistryClient, ProbeError> {
        RegistryClient::new(&self.registry.address(), self.registry.timeout()).map_err(|e| {
            ProbeError::RegistryUnreachable {
                addr: self.address(),
                reason: e.to_string(),
            }
        })
    }
}

/// Checks a dependency through the registry's catalog and aggregated
/// health status.
#[derive(Debug, Clone)]
pub struct RegistryProbe<G> {
    gateway: G,
}

impl<G: RegistryGateway> RegistryProbe<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<G: RegistryGateway> Probe for RegistryProbe<G> {
    async fn check(&self, dependency: &Dependency) -> Result<(), ProbeError> {
        info!(service = %dependency.service_id(), "checking service status by registry");

        if !self.gateway.is_reachable().await {
            return Err(ProbeError::RegistryUnreachable {
                addr: self.gateway.address(),
                reason: "connection refused or timed out".to_string(),
            });
        }

        let connection = self.gateway.new_connection()?;
        check_via_registry(dependency, &connection, &self.gateway.address()).await
    }
}

/// Healthy only if the service is in the catalog and its aggregated check
/// status is exactly `passing`.
///
/// The catalog and health queries are not atomic; a registration change in
/// between is simply seen on the next cycle.
pub async fn check_via_registry<C: RegistryConnection>(
    dependency: &Dependency,
    connection: &C,
    registry_addr: &str,
) -> Result<(), ProbeError> {
    let service = dependency.service_id();
    let query_failed = |e: ApiError| ProbeError::RegistryUnreachable {
        addr: registry_addr.to_string(),
        reason: e.to_string(),
    };

    let instances = connection
        .catalog_service(service)
        .await
        .map_err(query_failed)?;
    if instances.is_empty() {
        return Err(ProbeError::DependencyNotRegistered {
            service: service.to_string(),
        });
    }

    let checks = connection
        .health_checks(service)
        .await
        .map_err(query_failed)?;
    let status = aggregated_status(&checks);
    if status != HEALTH_PASSING {
        return Err(ProbeError::DependencyUnhealthy {
            service: service.to_string(),
            status,
        });
    }
    Ok(())
}
