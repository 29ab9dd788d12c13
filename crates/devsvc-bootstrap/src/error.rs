use devsvc_api::ApiError;
use devsvc_config::ConfigError;

/// Why a single readiness or verification attempt did not succeed.
///
/// Every variant is retryable: the owning loop logs it and tries again after
/// its fixed delay.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{dependency} ping timed out: {source}")]
    TransportTimeout {
        dependency: String,
        source: ApiError,
    },
    #[error("error getting {dependency} ping: {source}")]
    TransportUnreachable {
        dependency: String,
        source: ApiError,
    },
    #[error("registry cannot be reached at {addr}: {reason}")]
    RegistryUnreachable { addr: String, reason: String },
    #[error("{service} service hasn't started")]
    DependencyNotRegistered { service: String },
    #[error("{service} service hasn't become available (aggregated status {status:?})")]
    DependencyUnhealthy { service: String, status: String },
    #[error("{resource} client has not been initialized yet: {source}")]
    FunctionalProbeFailed { resource: String, source: ApiError },
}

impl ProbeError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportTimeout { .. } => "transport_timeout",
            Self::TransportUnreachable { .. } => "transport_unreachable",
            Self::RegistryUnreachable { .. } => "registry_unreachable",
            Self::DependencyNotRegistered { .. } => "not_registered",
            Self::DependencyUnhealthy { .. } => "unhealthy",
            Self::FunctionalProbeFailed { .. } => "functional_probe_failed",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TransportTimeout { .. })
    }
}

/// Setup failures. Unlike [`ProbeError`] these are fatal: they are checked
/// once before any retry loop starts.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to construct client: {0}")]
    Client(#[from] ApiError),
    #[error("dependency {0} was not confirmed healthy")]
    DependencyNotReady(String),
}
