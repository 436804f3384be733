//! Shared harness: spawns the gateway on an ephemeral port backed by a
//! `MemoryStore`, plus mock payment and completion providers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::Value;

use sap_gateway::api::build_app;
use sap_gateway::app_state::AppState;
use sap_gateway::config::SapConfig;
use sap_gateway::persistence::{DurableStore, MemoryStore};

/// Webhook secret configured for every test app.
pub const WEBHOOK_SECRET: &str = "whsec_integration";

/// Payment secret key configured when a Stripe mock is attached.
pub const STRIPE_KEY: &str = "sk_test_integration";

/// Completion API key configured when a completion mock is attached.
pub const COMPLETION_KEY: &str = "or_test_integration";

/// A running gateway.
pub struct TestApp {
    /// `http://127.0.0.1:<port>`.
    pub base: String,
    /// Bound address.
    pub addr: SocketAddr,
    /// The store behind the gateway, for inspection and failure injection.
    pub memory: Arc<MemoryStore>,
    /// HTTP client for requests.
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<(StatusCode, Value)> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::split(response).await
    }

    pub async fn get_json(&self, path: &str) -> anyhow::Result<(StatusCode, Value)> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::split(response).await
    }

    async fn split(response: reqwest::Response) -> anyhow::Result<(StatusCode, Value)> {
        let status = StatusCode::from_u16(response.status().as_u16())?;
        let body = response.json::<Value>().await?;
        Ok((status, body))
    }
}

/// Configuration pointing at nothing external; webhooks are verifiable.
pub fn base_config() -> SapConfig {
    let mut config = SapConfig::default();
    config.payment.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config.payment.api_base = "http://127.0.0.1:9".to_string();
    config.completion.api_base = "http://127.0.0.1:9".to_string();
    config.domain = "http://sap.test".to_string();
    config.http_timeout_secs = 5;
    config
}

pub async fn spawn_app(config: SapConfig) -> anyhow::Result<TestApp> {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DurableStore> = Arc::clone(&memory) as Arc<dyn DurableStore>;
    let state = AppState::from_config(&config, store)?;
    let router = build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestApp {
        base: format!("http://{addr}"),
        addr,
        memory,
        client: reqwest::Client::new(),
    })
}

async fn spawn_router(router: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

/// One checkout request as seen by the mock provider.
#[derive(Debug, Clone)]
pub struct CapturedCheckout {
    pub authorization: Option<String>,
    pub form: HashMap<String, String>,
}

/// Requests received by the mock payment provider.
pub type Captured = Arc<Mutex<Vec<CapturedCheckout>>>;

/// Mock payment provider answering `POST /v1/checkout/sessions` with
/// `{"id": "cs_test_123"}`.
pub async fn spawn_stripe_mock() -> anyhow::Result<(String, Captured)> {
    async fn create_session(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Ok(mut guard) = captured.lock() {
            guard.push(CapturedCheckout {
                authorization,
                form,
            });
        }
        Json(serde_json::json!({ "id": "cs_test_123", "object": "checkout.session" }))
    }

    let captured: Captured = Arc::default();
    let router = Router::new()
        .route("/v1/checkout/sessions", post(create_session))
        .with_state(Arc::clone(&captured));
    Ok((spawn_router(router).await?, captured))
}

/// Mock completion API answering every `POST /chat/completions` with a
/// fixed status and body.
pub async fn spawn_completion_mock(status: StatusCode, body: Value) -> anyhow::Result<String> {
    let router = Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap| {
            let body = body.clone();
            async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some(format!("Bearer {COMPLETION_KEY}").as_str());
                if authorized {
                    (status, Json(body))
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({ "error": "bad key" })),
                    )
                }
            }
        }),
    );
    spawn_router(router).await
}

pub fn as_f64(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

pub fn as_u64(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
