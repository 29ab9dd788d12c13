use devsvc_api::RegistryClient;
use devsvc_config::Config;
use tracing::info;

use crate::dependency::Dependency;
use crate::endpoint::EndpointResolver;
use crate::error::BootstrapError;
use crate::probe::HealthChecker;

/// Everything the bootstrap needs, built once from configuration and passed
/// down explicitly.
pub struct BootstrapContext {
    pub config: Config,
    pub dependencies: Vec<Dependency>,
    /// Fixed for the life of the process.
    pub checker: HealthChecker,
    pub resolver: EndpointResolver,
}

impl BootstrapContext {
    /// Validate `config` and derive the checker and resolver from it.
    ///
    /// Invalid configuration is rejected here, before any retry loop starts.
    pub fn new(config: Config) -> Result<Self, BootstrapError> {
        config.validate()?;

        let checker = HealthChecker::for_config(&config);
        let resolver = if config.discovery.uses_registry() {
            let registry = &config.registry;
            EndpointResolver::new(Some(RegistryClient::new(
                &registry.address(),
                registry.timeout(),
            )?))
        } else {
            EndpointResolver::new(None)
        };
        let dependencies = Dependency::required(&config);

        info!(
            service = %config.service.name,
            discovery = %checker.mode(),
            dependencies = dependencies.len(),
            "bootstrap context ready"
        );

        Ok(Self {
            config,
            dependencies,
            checker,
            resolver,
        })
    }
}
