//! HTTP client for the tracking server.

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::detect::Detection;
use super::{SdkConfig, SdkError};
use crate::api::dto::{
    CheckoutRequest, CheckoutResponse, GenerateRequest, GenerateResponse, TrackRequest,
    TrackResponse, UserStatusResponse,
};
use crate::domain::{GlobalSnapshot, PaymentType, SourceTag, estimate_tokens, truncate_prompt};
use crate::error::ErrorResponse;

/// Optional measurements attached to a tracked prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackOptions {
    /// Token count; estimated from the prompt length when absent.
    pub tokens: Option<u64>,
    /// Measured energy in kWh.
    pub energy: Option<f64>,
    /// Measured CO2 in kg.
    pub co2: Option<f64>,
    /// How the prompt was detected.
    pub source: Option<SourceTag>,
}

/// Client for the tracking server's HTTP API.
///
/// Holds the latest totals it has seen. Use [`SapClient::subscribe`] to
/// be notified when they change.
#[derive(Debug)]
pub struct SapClient {
    http: Client,
    base_url: Url,
    config: SdkConfig,
    stats: watch::Sender<Option<GlobalSnapshot>>,
}

impl SapClient {
    /// Validates `config` and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidConfig`] if the configuration is invalid
    /// or the API key is not a valid header value, and [`SdkError::Http`]
    /// if the HTTP client cannot be built.
    pub fn new(config: SdkConfig) -> Result<Self, SdkError> {
        let base_url = config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| SdkError::InvalidConfig(format!("api_key: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .user_agent(concat!("sap-sdk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (stats, _) = watch::channel(None);
        Ok(Self {
            http,
            base_url,
            config,
            stats,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The user identity attached to every request.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// Tracks one prompt and stores the returned totals.
    ///
    /// The prompt is truncated before sending; the token estimate, when
    /// needed, uses the full text.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Http`] on transport failure and
    /// [`SdkError::Server`] when the server rejects the request.
    pub async fn track_prompt(
        &self,
        prompt: &str,
        model: &str,
        options: TrackOptions,
    ) -> Result<GlobalSnapshot, SdkError> {
        let body = TrackRequest {
            prompt: Some(truncate_prompt(prompt).to_string()),
            model: Some(model.to_string()),
            tokens: Some(options.tokens.unwrap_or_else(|| estimate_tokens(prompt))),
            energy: options.energy,
            co2: options.co2,
            user_id: Some(self.config.user_id.clone()),
            source: options.source,
        };

        let response: TrackResponse = self.post(&["api", "track"], &body).await?;
        tracing::debug!(
            total_prompts = response.stats.total_prompts,
            "prompt tracked"
        );
        self.stats.send_replace(Some(response.stats));
        Ok(response.stats)
    }

    /// Tracks a detected prompt when auto-tracking is enabled.
    ///
    /// Returns `Ok(None)` without contacting the server when
    /// [`SdkConfig::auto_track`] is off.
    ///
    /// # Errors
    ///
    /// Same as [`SapClient::track_prompt`].
    pub async fn track_detection(
        &self,
        detection: &Detection,
        model: &str,
    ) -> Result<Option<GlobalSnapshot>, SdkError> {
        if !self.config.auto_track {
            return Ok(None);
        }
        let options = TrackOptions {
            source: Some(detection.source),
            ..TrackOptions::default()
        };
        self.track_prompt(&detection.prompt, model, options)
            .await
            .map(Some)
    }

    /// Fetches the current totals from the server and stores them.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Http`] on transport failure and
    /// [`SdkError::Server`] on a non-success status.
    pub async fn load_stats(&self) -> Result<GlobalSnapshot, SdkError> {
        let url = self.endpoint(&["api", "stats"])?;
        let stats: GlobalSnapshot = read(self.http.get(url).send().await?).await?;
        self.stats.send_replace(Some(stats));
        Ok(stats)
    }

    /// The latest totals seen by this client, if any.
    #[must_use]
    pub fn stats(&self) -> Option<GlobalSnapshot> {
        *self.stats.borrow()
    }

    /// Zeroes the locally held totals. The server is not affected.
    pub fn reset_stats(&self) {
        self.stats
            .send_replace(Some(GlobalSnapshot::empty(Utc::now())));
    }

    /// Watches the locally held totals.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<GlobalSnapshot>> {
        self.stats.subscribe()
    }

    /// Refreshes the totals every [`SdkConfig::poll_interval`] until the
    /// returned task is aborted. Failed refreshes are logged and retried
    /// on the next tick.
    #[must_use]
    pub fn spawn_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.config.poll_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = client.load_stats().await {
                    tracing::warn!(error = %e, "stats refresh failed");
                }
            }
        })
    }

    /// Fetches this user's payment-derived status.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Http`] on transport failure and
    /// [`SdkError::Server`] on a non-success status.
    pub async fn user_status(&self) -> Result<UserStatusResponse, SdkError> {
        let url = self.endpoint(&["api", "user", &self.config.user_id])?;
        read(self.http.get(url).send().await?).await
    }

    /// Tracks `prompt` and asks the server for a completion.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Http`] on transport failure and
    /// [`SdkError::Server`] when tracking or generation fails server-side.
    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<GenerateResponse, SdkError> {
        let body = GenerateRequest {
            prompt: prompt.to_string(),
            model: model.map(str::to_string),
            user_id: Some(self.config.user_id.clone()),
        };
        self.post(&["api", "generate"], &body).await
    }

    /// Starts a checkout for this user and returns the session id.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Http`] on transport failure and
    /// [`SdkError::Server`] when the server cannot create the session.
    pub async fn create_checkout_session(
        &self,
        payment_type: PaymentType,
        price_id: &str,
    ) -> Result<String, SdkError> {
        let body = CheckoutRequest {
            price_id: price_id.to_string(),
            user_id: self.config.user_id.clone(),
            payment_type,
        };
        let response: CheckoutResponse = self
            .post(&["api", "create-checkout-session"], &body)
            .await?;
        Ok(response.session_id)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SdkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SdkError::InvalidConfig("server_url cannot have a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, SdkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        read(self.http.post(url).json(body).send().await?).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, SdkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(SdkError::Server {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn client(server_url: &str) -> SapClient {
        let config = SdkConfig {
            server_url: server_url.to_string(),
            user_id: "user abc/1".to_string(),
            ..SdkConfig::default()
        };
        let Ok(client) = SapClient::new(config) else {
            panic!("valid config rejected");
        };
        client
    }

    #[test]
    fn endpoints_are_joined_and_encoded() {
        let client = client("http://localhost:3001/");
        let Ok(url) = client.endpoint(&["api", "user", client.user_id()]) else {
            panic!("endpoint failed");
        };
        assert_eq!(url.as_str(), "http://localhost:3001/api/user/user%20abc%2F1");
    }

    #[test]
    fn endpoints_keep_a_path_prefix() {
        let client = client("https://example.com/sap");
        let Ok(url) = client.endpoint(&["api", "stats"]) else {
            panic!("endpoint failed");
        };
        assert_eq!(url.as_str(), "https://example.com/sap/api/stats");
    }

    #[test]
    fn local_stats_can_be_watched_and_reset() {
        let client = client("http://localhost:3001");
        assert!(client.stats().is_none());

        let rx = client.subscribe();
        let snapshot = GlobalSnapshot::empty(Utc::now());
        client.stats.send_replace(Some(snapshot));
        assert_eq!(*rx.borrow(), Some(snapshot));
        assert_eq!(client.stats(), Some(snapshot));

        client.stats.send_replace(Some(GlobalSnapshot {
            total_prompts: 3,
            total_energy: 0.3,
            total_co2: 0.15,
            last_updated: Utc::now(),
        }));
        client.reset_stats();
        let Some(reset) = client.stats() else {
            panic!("reset must keep a zeroed snapshot");
        };
        assert_eq!(reset.total_prompts, 0);
        assert!(reset.total_energy.abs() < f64::EPSILON);
        assert!(reset.total_co2.abs() < f64::EPSILON);
        assert_eq!(*rx.borrow(), Some(reset));
    }

    #[test]
    fn api_key_must_be_a_header_value() {
        let config = SdkConfig {
            api_key: Some("bad\nkey".into()),
            ..SdkConfig::default()
        };
        assert!(matches!(
            SapClient::new(config),
            Err(SdkError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn disabled_auto_track_skips_the_server() {
        let config = SdkConfig {
            server_url: "http://127.0.0.1:9".into(),
            auto_track: false,
            ..SdkConfig::default()
        };
        let Ok(client) = SapClient::new(config) else {
            panic!("valid config rejected");
        };
        let detection = Detection {
            source: SourceTag::FormSubmission,
            prompt: "a long enough prompt".into(),
        };
        let Ok(result) = client.track_detection(&detection, "gpt-4").await else {
            panic!("disabled auto-track must not fail");
        };
        assert!(result.is_none());
    }
}
