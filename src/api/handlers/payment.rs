//! Checkout session and payment webhook handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{CheckoutRequest, CheckoutResponse, WebhookAck};
use crate::app_state::AppState;
use crate::clients::stripe::CHECKOUT_COMPLETED;
use crate::clients::{CheckoutSession, WebhookEvent};
use crate::error::{ErrorResponse, SapError};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /api/create-checkout-session`: Start a checkout.
///
/// # Errors
///
/// Returns [`SapError::InvalidRequest`] on a malformed body and
/// [`SapError::Checkout`] when the provider call fails.
#[utoipa::path(
    post,
    path = "/api/create-checkout-session",
    tag = "Payments",
    summary = "Create a checkout session",
    description = "Creates a one-item card checkout session at the payment provider carrying the user id and payment type as metadata.",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Session created", body = CheckoutResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Provider call failed", body = ErrorResponse),
    )
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, SapError> {
    let Json(req) = payload.map_err(|e| SapError::InvalidRequest(e.body_text()))?;
    let session_id = state
        .stripe
        .create_checkout_session(&req.price_id, &req.user_id, req.payment_type)
        .await?;
    Ok(Json(CheckoutResponse { session_id }))
}

/// `POST /stripe-webhook`: Payment provider notifications.
///
/// Only the signature decides the status code. Once verified, every
/// event is acknowledged; problems handling it are logged.
///
/// # Errors
///
/// Returns [`SapError::InvalidSignature`] when the signature header is
/// missing or does not verify.
#[utoipa::path(
    post,
    path = "/stripe-webhook",
    tag = "Payments",
    summary = "Payment webhook",
    description = "Verifies the Stripe-Signature header over the raw body and records a payment for every completed checkout session.",
    request_body(content = String, content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>"),
    ),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Signature verification failed", body = ErrorResponse),
    )
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, SapError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| SapError::InvalidSignature("missing signature header".into()))?;

    state
        .webhooks
        .verify(&body, signature, Utc::now().timestamp())?;

    let event = match WebhookEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "verified webhook is not a readable event");
            return Ok(Json(WebhookAck { received: true }));
        }
    };

    tracing::debug!(
        event_type = %event.event_type,
        event_id = event.id.as_deref().unwrap_or(""),
        "webhook verified"
    );

    if event.event_type == CHECKOUT_COMPLETED {
        record_completed_checkout(&state, event).await;
    }

    Ok(Json(WebhookAck { received: true }))
}

async fn record_completed_checkout(state: &AppState, event: WebhookEvent) {
    let session: CheckoutSession = match serde_json::from_value(event.data.object) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "completed checkout without a readable session");
            return;
        }
    };

    let record = match session.to_payment_record(Utc::now()) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, session_id = %session.id, "skipping completed checkout");
            return;
        }
    };

    if let Err(e) = state.accounts.record_payment(record).await {
        tracing::error!(error = %e, session_id = %session.id, "failed to record payment");
    }
}

/// Payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/stripe-webhook", post(stripe_webhook))
}
