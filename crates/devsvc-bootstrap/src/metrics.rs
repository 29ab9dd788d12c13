use prometheus::{IntCounterVec, IntGaugeVec, Opts};

lazy_static::lazy_static! {
    pub static ref READINESS_PROBE_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "devsvc_readiness_probe_total",
            "Total number of dependency health checks by outcome"
        ),
        &["dependency", "result"]
    )
    .unwrap();

    pub static ref DEPENDENCY_READY: IntGaugeVec = prometheus::register_int_gauge_vec!(
        Opts::new(
            "devsvc_dependency_ready",
            "1 once the dependency has passed the readiness gate"
        ),
        &["dependency"]
    )
    .unwrap();

    pub static ref VERIFY_ATTEMPTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "devsvc_verify_attempts_total",
            "Total number of post-initialization list calls by outcome"
        ),
        &["resource", "result"]
    )
    .unwrap();
}

pub fn increment_probe_total(dependency: &str, result: &str) {
    READINESS_PROBE_TOTAL
        .with_label_values(&[dependency, result])
        .inc();
}

pub fn set_dependency_ready(dependency: &str, ready: bool) {
    DEPENDENCY_READY
        .with_label_values(&[dependency])
        .set(i64::from(ready));
}

/// Whether `dependency` has passed the readiness gate.
pub fn dependency_ready(dependency: &str) -> bool {
    DEPENDENCY_READY.with_label_values(&[dependency]).get() == 1
}

pub fn increment_verify_attempts(resource: &str, result: &str) {
    VERIFY_ATTEMPTS_TOTAL
        .with_label_values(&[resource, result])
        .inc();
}
