use std::time::Duration;

use devsvc_api::{ListResources, ResourceKind};
use tracing::{info, warn};

use crate::clients::ServiceClients;
use crate::error::ProbeError;
use crate::metrics;
use crate::retry::Retry;

/// Resources listed after construction. core-metadata seeds both with
/// defaults once it is up, so a successful list means it finished starting.
pub const VERIFIED_RESOURCES: [ResourceKind; 2] = [ResourceKind::Schedule, ResourceKind::ScheduleEvent];

/// Final functional check through freshly built clients.
///
/// Retries on its own, shorter interval: by now the dependency is reachable
/// and failures are expected to clear quickly.
pub struct PostInitVerifier {
    interval: Duration,
}

impl PostInitVerifier {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn verify(&self, clients: &ServiceClients) {
        for kind in VERIFIED_RESOURCES {
            self.verify_list(kind.path(), clients.get(kind)).await;
        }
    }

    /// Call `list` on `handle` until it succeeds.
    pub async fn verify_list<L: ListResources>(&self, resource: &str, handle: &L) {
        let mut retry = Retry::every(self.interval);
        let count = retry
            .until_ok(
                move || async move {
                    handle
                        .list()
                        .await
                        .map_err(|source| ProbeError::FunctionalProbeFailed {
                            resource: resource.to_string(),
                            source,
                        })
                },
                |err, attempt| {
                    metrics::increment_verify_attempts(resource, err.kind());
                    warn!(%resource, attempt, error = %err, "client not initialized yet, waiting");
                },
            )
            .await
            .len();

        metrics::increment_verify_attempts(resource, "ok");
        info!(%resource, items = count, attempts = retry.attempts(), "client initialized");
    }
}
