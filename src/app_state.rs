//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::http::build_client;
use crate::clients::{CompletionClient, StripeClient, WebhookVerifier};
use crate::config::SapConfig;
use crate::domain::{AggregateStore, DurabilityMode, EventBus};
use crate::persistence::DurableStore;
use crate::service::{AccountService, TrackingService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tracking write path and snapshot reads.
    pub tracking: Arc<TrackingService>,
    /// Payment history and derived user status.
    pub accounts: Arc<AccountService>,
    /// Checkout session creation.
    pub stripe: Arc<StripeClient>,
    /// Webhook signature verification.
    pub webhooks: Arc<WebhookVerifier>,
    /// Completion API proxy.
    pub completion: Arc<CompletionClient>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Model used by `/api/generate` when the request names none.
    pub default_model: Arc<str>,
    /// Upper bound on handling one inbound request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires services and collaborators on top of a durable store.
    ///
    /// Totals start at zero; call [`crate::domain::AggregateStore::hydrate`]
    /// through [`AppState::tracking`] to resume from the durable store.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn from_config(
        config: &SapConfig,
        store: Arc<dyn DurableStore>,
    ) -> Result<Self, reqwest::Error> {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let mode = if config.strict_persistence {
            DurabilityMode::Strict
        } else {
            DurabilityMode::BestEffort
        };

        let aggregates = Arc::new(AggregateStore::new(
            Arc::clone(&store),
            event_bus.clone(),
            mode,
        ));
        let http = build_client(config.http_timeout_secs)?;

        Ok(Self {
            tracking: Arc::new(TrackingService::new(aggregates)),
            accounts: Arc::new(AccountService::new(store, event_bus.clone())),
            stripe: Arc::new(StripeClient::new(
                http.clone(),
                &config.payment,
                &config.domain,
            )),
            webhooks: Arc::new(WebhookVerifier::new(&config.payment)),
            completion: Arc::new(CompletionClient::new(http, &config.completion)),
            event_bus,
            default_model: Arc::from(config.completion.default_model.as_str()),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        })
    }
}
