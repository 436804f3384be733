//! Shared `reqwest` client construction.

use std::time::Duration;

use reqwest::Client;

/// Builds an HTTP client with a request timeout.
///
/// # Errors
///
/// Returns the `reqwest` builder error if the TLS backend cannot be
/// initialized.
pub fn build_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("sap-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}
