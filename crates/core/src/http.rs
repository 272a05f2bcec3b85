use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client. Every provider call is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("linguaio/", env!("CARGO_PKG_VERSION")))
        .build()
}
