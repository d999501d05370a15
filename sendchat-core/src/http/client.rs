//! Shared reqwest client construction

use crate::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default user agent
pub const USER_AGENT: &str = concat!("sendchat/", env!("CARGO_PKG_VERSION"));

/// Build a pooled client with the given per-request timeout
pub fn build_client(request_timeout: Duration) -> ProviderResult<Client> {
    ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()
        .map_err(|e| ProviderError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Join a base URL and an endpoint path with exactly one slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
