//! Client configuration.

use std::time::Duration;

use reqwest::Url;

use super::SdkError;

/// Default server the SDK talks to.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Default interval between background stats refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`super::SapClient`].
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL of the tracking server.
    pub server_url: String,
    /// Sent as a bearer token on every request when set.
    pub api_key: Option<String>,
    /// Identity attached to tracked prompts and payments.
    pub user_id: String,
    /// Whether detected prompts are tracked automatically.
    pub auto_track: bool,
    /// Interval of [`super::SapClient::spawn_polling`].
    pub poll_interval: Duration,
    /// Timeout of each HTTP request.
    pub request_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            user_id: generate_user_id(),
            auto_track: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SdkConfig {
    /// Checks the configuration and returns the parsed server URL.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidConfig`] for an empty or non-HTTP server
    /// URL, an empty user id, or a zero interval.
    pub fn validate(&self) -> Result<Url, SdkError> {
        let raw = self.server_url.trim().trim_end_matches('/');
        if raw.is_empty() {
            return Err(SdkError::InvalidConfig("server_url is empty".into()));
        }
        let url = Url::parse(raw)
            .map_err(|e| SdkError::InvalidConfig(format!("server_url {raw:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SdkError::InvalidConfig(format!(
                "server_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(SdkError::InvalidConfig("user_id is empty".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(SdkError::InvalidConfig("poll_interval must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(SdkError::InvalidConfig(
                "request_timeout must be non-zero".into(),
            ));
        }
        Ok(url)
    }
}

/// Generates `user_<9 random chars>_<unix millis>`.
#[must_use]
pub fn generate_user_id() -> String {
    let random: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("user_{random}_{}", chrono::Utc::now().timestamp_millis())
}
