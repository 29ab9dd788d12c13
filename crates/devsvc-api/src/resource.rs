use std::time::Duration;

use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::API_PREFIX;
use crate::client::{ApiError, HttpClient};
use crate::registry::RegistryClient;

/// Resource collections exposed by core-metadata and core-data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Addressable,
    Device,
    DeviceService,
    DeviceProfile,
    Schedule,
    ScheduleEvent,
    Event,
    ValueDescriptor,
}

impl ResourceKind {
    /// Path segment under `/api/v1`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Addressable => "addressable",
            Self::Device => "device",
            Self::DeviceService => "deviceservice",
            Self::DeviceProfile => "deviceprofile",
            Self::Schedule => "schedule",
            Self::ScheduleEvent => "scheduleevent",
            Self::Event => "event",
            Self::ValueDescriptor => "valuedescriptor",
        }
    }

    /// `/api/v1/{path}`
    pub fn api_path(&self) -> String {
        format!("{API_PREFIX}/{}", self.path())
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a resource client sends its requests.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// Always the configured URL.
    Fixed(Url),
    /// Looked up in the registry catalog on every call, so the client
    /// follows the service if it moves. Falls back to `fallback` when the
    /// lookup fails or finds no instance.
    Registry {
        registry: RegistryClient,
        service_id: String,
        path: String,
        fallback: Url,
    },
}

impl Endpoint {
    /// The base URL to use for the next request.
    pub async fn resolve(&self) -> Url {
        match self {
            Self::Fixed(url) => url.clone(),
            Self::Registry {
                registry,
                service_id,
                path,
                fallback,
            } => match registry.resolve_instance(service_id).await {
                Ok(Some(host_port)) => {
                    let scheme = fallback.scheme();
                    match Url::parse(&format!("{scheme}://{host_port}{path}")) {
                        Ok(url) => url,
                        Err(e) => {
                            warn!(service = %service_id, %host_port, error = %e, "registry returned unusable address, using configured URL");
                            fallback.clone()
                        }
                    }
                }
                Ok(None) => {
                    warn!(service = %service_id, "service not in registry catalog, using configured URL");
                    fallback.clone()
                }
                Err(e) => {
                    warn!(service = %service_id, error = %e, "registry lookup failed, using configured URL");
                    fallback.clone()
                }
            },
        }
    }

    /// The URL this endpoint was configured with.
    pub fn configured_url(&self) -> &Url {
        match self {
            Self::Fixed(url) => url,
            Self::Registry { fallback, .. } => fallback,
        }
    }
}

/// The capability the post-initialization check relies on.
pub trait ListResources: Send + Sync {
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Value>, ApiError>> + Send;
}

/// Client for one resource collection on one core service.
///
/// Cheap to clone and holds no mutable state, so it can be shared freely
/// once built.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    kind: ResourceKind,
    endpoint: Endpoint,
    http: HttpClient,
}

impl ResourceClient {
    pub fn new(
        kind: ResourceKind,
        endpoint: Endpoint,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::new(endpoint.configured_url().as_str(), Some(timeout))?;
        Ok(Self {
            kind,
            endpoint,
            http,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// GET `{base}/{id}`
    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        let url = child_url(self.endpoint.resolve().await, &[id])?;
        self.http.get_url(url).await
    }

    /// GET `{base}/name/{name}`
    pub async fn get_by_name(&self, name: &str) -> Result<Value, ApiError> {
        let url = child_url(self.endpoint.resolve().await, &["name", name])?;
        self.http.get_url(url).await
    }
}

impl ListResources for ResourceClient {
    /// GET `{base}`
    async fn list(&self) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint.resolve().await;
        self.http.get_url(url).await
    }
}

fn child_url(mut base: Url, segments: &[&str]) -> Result<Url, ApiError> {
    base.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(base)
}
