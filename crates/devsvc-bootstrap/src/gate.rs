use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::dependency::Dependency;
use crate::metrics;
use crate::probe::Probe;
use crate::retry::Retry;

/// Proof that every dependency passed the readiness gate.
///
/// Only [`ReadinessGate::wait_all`] can produce one, and resource clients can
/// only be built from one.
#[derive(Debug)]
pub struct ReadyDependencies {
    dependencies: Vec<Dependency>,
}

impl ReadyDependencies {
    pub fn get(&self, key: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Blocks until every dependency reports healthy.
///
/// One branch per dependency runs concurrently; each retries forever at a
/// fixed interval. There is no overall timeout and no failure outcome.
pub struct ReadinessGate<'a, P> {
    probe: &'a P,
    retry_interval: Duration,
}

impl<'a, P: Probe> ReadinessGate<'a, P> {
    pub fn new(probe: &'a P, retry_interval: Duration) -> Self {
        Self {
            probe,
            retry_interval,
        }
    }

    pub async fn wait_all(&self, dependencies: &[Dependency]) -> ReadyDependencies {
        info!(
            count = dependencies.len(),
            interval_ms = self.retry_interval.as_millis() as u64,
            "waiting for dependency services"
        );

        join_all(dependencies.iter().map(|dep| self.wait_for(dep))).await;

        info!("all dependency services are available");
        ReadyDependencies {
            dependencies: dependencies.to_vec(),
        }
    }

    async fn wait_for(&self, dependency: &Dependency) {
        metrics::set_dependency_ready(&dependency.key, false);

        let probe = self.probe;
        let mut retry = Retry::every(self.retry_interval);
        retry
            .until_ok(
                move || probe.check(dependency),
                |err, attempt| {
                    metrics::increment_probe_total(&dependency.key, err.kind());
                    // Timeouts and other failures share the same retry cadence.
                    if err.is_timeout() {
                        warn!(dependency = %dependency.key, attempt, error = %err, "health check timed out, retrying");
                    } else {
                        error!(dependency = %dependency.key, attempt, kind = err.kind(), error = %err, "dependency not ready, retrying");
                    }
                },
            )
            .await;

        metrics::increment_probe_total(&dependency.key, "healthy");
        metrics::set_dependency_ready(&dependency.key, true);
        info!(dependency = %dependency.key, attempts = retry.attempts(), "dependency service is available");
    }
}
