//! The process's own status surface: liveness, bootstrap progress and
//! Prometheus metrics.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{info, warn};

use crate::metrics;

/// Where the bootstrap is, as reported by `/readyz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At least one dependency has not passed its health check yet.
    Waiting,
    /// Every dependency is healthy; the clients are being verified.
    Verifying,
    /// Clients are built and verified.
    Ready,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Verifying => "verifying",
            Self::Ready => "ready",
        }
    }
}

/// Shared by the status handlers and the bootstrap task.
///
/// Per-dependency progress is read from the `devsvc_dependency_ready` gauge,
/// which the readiness gate keeps up to date.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<Inner>,
}

struct Inner {
    service: String,
    dependencies: Vec<String>,
    verified: AtomicBool,
}

impl ServerState {
    pub fn new<I, S>(service: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(Inner {
                service: service.into(),
                dependencies: dependencies.into_iter().map(Into::into).collect(),
                verified: AtomicBool::new(false),
            }),
        }
    }

    /// Call once the bootstrap has returned its verified clients.
    pub fn set_ready(&self) {
        self.inner.verified.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.inner.verified.load(Ordering::Acquire)
    }

    /// Dependencies that have not passed the readiness gate yet.
    pub fn pending(&self) -> Vec<&str> {
        self.inner
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|key| !metrics::dependency_ready(key))
            .collect()
    }

    pub fn phase(&self) -> Phase {
        if self.is_ready() {
            Phase::Ready
        } else if self.pending().is_empty() {
            Phase::Verifying
        } else {
            Phase::Waiting
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state)
}

pub async fn run(port: u16, state: ServerState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn metrics_handler() -> Response {
    match prometheus::TextEncoder::new().encode_to_string(&prometheus::gather()) {
        Ok(body) => body.into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn healthz_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({ "service": state.inner.service, "status": "ok" }))
}

/// 200 only in [`Phase::Ready`]; 503 otherwise, listing what is still pending.
async fn readyz_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let phase = state.phase();
    let code = if phase == Phase::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "service": state.inner.service,
        "phase": phase.as_str(),
        "pending": state.pending(),
    });
    (code, Json(body))
}
