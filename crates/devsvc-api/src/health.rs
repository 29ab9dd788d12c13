use std::time::Duration;

use crate::API_PREFIX;
use crate::client::{ApiError, HttpClient};

/// Client for the liveness endpoint every core service exposes at
/// `GET /api/v1/ping`.
#[derive(Debug, Clone)]
pub struct PingClient {
    http: HttpClient,
}

impl PingClient {
    /// `address` is the service root (e.g. `http://edgex-core-data:48080`).
    pub fn new(address: &str, timeout: Duration) -> Result<Self, ApiError> {
        let url = format!("{}{API_PREFIX}/", address.trim_end_matches('/'));
        Ok(Self {
            http: HttpClient::new(&url, Some(timeout))?,
        })
    }

    /// GET `/api/v1/ping`, failing with [`ApiError::ApiResponse`] on a
    /// non-2xx answer.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.http.get_status("ping").await
    }
}
