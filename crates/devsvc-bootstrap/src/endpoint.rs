use devsvc_api::{API_PREFIX, ApiError, Endpoint, RegistryClient};
use url::Url;

use crate::dependency::Dependency;

/// Turns a healthy dependency plus a resource path into the base address a
/// resource client talks to.
#[derive(Debug, Clone, Default)]
pub struct EndpointResolver {
    registry: Option<RegistryClient>,
}

impl EndpointResolver {
    /// With a registry client, endpoints re-resolve through the registry on
    /// every call.
    pub fn new(registry: Option<RegistryClient>) -> Self {
        Self { registry }
    }

    pub fn uses_registry(&self) -> bool {
        self.registry.is_some()
    }

    /// `protocol://host:port/api/v1/{resource_path}`
    pub fn resolve(dependency: &Dependency, resource_path: &str) -> String {
        format!(
            "{}{API_PREFIX}/{}",
            dependency.address(),
            resource_path.trim_start_matches('/')
        )
    }

    pub fn endpoint(&self, dependency: &Dependency, resource_path: &str) -> Result<Endpoint, ApiError> {
        let url = Url::parse(&Self::resolve(dependency, resource_path))?;
        Ok(match &self.registry {
            Some(registry) => Endpoint::Registry {
                registry: registry.clone(),
                service_id: dependency.service_id().to_string(),
                path: url.path().to_string(),
                fallback: url,
            },
            None => Endpoint::Fixed(url),
        })
    }
}
