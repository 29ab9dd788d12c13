//! Dependency-readiness bootstrap for a device service.
//!
//! [`bootstrap`] blocks until core-metadata and core-data are healthy, builds
//! the resource clients, and checks that the clients actually work before
//! handing them back.

pub mod clients;
pub mod context;
pub mod dependency;
pub mod endpoint;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod probe;
pub mod retry;
pub mod server;
pub mod telemetry;
pub mod verify;

use tracing::info;

pub use clients::ServiceClients;
pub use context::BootstrapContext;
pub use dependency::Dependency;
pub use endpoint::EndpointResolver;
pub use error::{BootstrapError, ProbeError};
pub use gate::{ReadinessGate, ReadyDependencies};
pub use probe::{HealthChecker, Probe};
pub use verify::PostInitVerifier;

/// Run the whole readiness protocol with the context's own health checker.
pub async fn bootstrap(ctx: &BootstrapContext) -> Result<ServiceClients, BootstrapError> {
    bootstrap_with(ctx, &ctx.checker).await
}

/// Run the readiness protocol with an explicit probe.
///
/// Only returns once every dependency was healthy, every client was built
/// and the verification calls succeeded. Never gives up on its own.
pub async fn bootstrap_with<P: Probe>(
    ctx: &BootstrapContext,
    probe: &P,
) -> Result<ServiceClients, BootstrapError> {
    let readiness = &ctx.config.readiness;

    let ready = ReadinessGate::new(probe, readiness.retry_interval())
        .wait_all(&ctx.dependencies)
        .await;

    let clients = ServiceClients::build(&ready, &ctx.resolver)?;

    PostInitVerifier::new(readiness.verify_interval())
        .verify(&clients)
        .await;

    info!("service clients initialized");
    Ok(clients)
}
