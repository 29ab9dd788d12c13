//! HTTP clients for the services a device service depends on: the direct
//! ping endpoint, the Consul registry, and the core-metadata / core-data
//! resource APIs.

pub mod client;
pub mod health;
pub mod registry;
pub mod resource;

pub use client::{ApiError, HttpClient};
pub use health::PingClient;
pub use registry::{
    CatalogService, HealthCheckEntry, RegistryClient, aggregated_status, HEALTH_CRITICAL,
    HEALTH_MAINTENANCE, HEALTH_PASSING, HEALTH_WARNING,
};
pub use resource::{Endpoint, ListResources, ResourceClient, ResourceKind};

/// Path prefix shared by every core service REST API.
pub const API_PREFIX: &str = "/api/v1";
