//! Payment provider client: checkout sessions and webhook verification.
//!
//! Checkout sessions are created with the provider's form-encoded REST API.
//! Webhooks carry a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]`, where each `v1` is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint secret.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::PaymentConfig;
use crate::domain::{PaymentRecord, PaymentType};
use crate::error::SapError;

/// Event type that results in a payment record.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Client for the payment provider's checkout API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: Option<String>,
    api_base: String,
    domain: String,
}

#[derive(Deserialize)]
struct CreatedSession {
    id: String,
}

impl StripeClient {
    /// Creates a client from configuration.
    ///
    /// `domain` is the public URL of this deployment, used for the
    /// success and cancel redirects.
    #[must_use]
    pub fn new(client: Client, config: &PaymentConfig, domain: &str) -> Self {
        Self {
            client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            domain: domain.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a one-item, card, payment-mode checkout session.
    ///
    /// Returns the session id.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Checkout`] if no secret key is configured, the
    /// request fails, or the provider answers with a non-success status.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        user_id: &str,
        payment_type: PaymentType,
    ) -> Result<String, SapError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| SapError::Checkout("payment secret key not configured".into()))?;

        let success_url = format!(
            "{}/sap?session_id={{CHECKOUT_SESSION_ID}}&success=true",
            self.domain
        );
        let cancel_url = format!("{}/sap?canceled=true", self.domain);
        let form = [
            ("payment_method_types[]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("mode", "payment"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("metadata[userId]", user_id),
            ("metadata[type]", payment_type.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| SapError::Checkout(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SapError::Checkout(format!(
                "provider returned {status}: {body}"
            )));
        }

        let session: CreatedSession = response
            .json()
            .await
            .map_err(|e| SapError::Checkout(format!("invalid response body: {e}")))?;

        tracing::info!(session_id = %session.id, user_id, %payment_type, "checkout session created");
        Ok(session.id)
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Provider event id.
    #[serde(default)]
    pub id: Option<String>,
    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: WebhookData,
}

impl WebhookEvent {
    /// Parses a verified payload.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::InvalidRequest`] if the payload is not a webhook
    /// event.
    pub fn parse(payload: &[u8]) -> Result<Self, SapError> {
        serde_json::from_slice(payload)
            .map_err(|e| SapError::InvalidRequest(format!("webhook payload: {e}")))
    }
}

/// Payload wrapper of a [`WebhookEvent`].
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    /// The object the event is about.
    pub object: serde_json::Value,
}

/// The subset of a checkout session needed to record a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id, kept as the payment's external reference.
    pub id: String,
    /// Total in minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Metadata attached at session creation.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSession {
    /// Builds the payment record for this completed session.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::InvalidRequest`] if the `userId` or `type`
    /// metadata is missing or the type is unknown.
    pub fn to_payment_record(&self, at: DateTime<Utc>) -> Result<PaymentRecord, SapError> {
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| SapError::InvalidRequest(format!("session {} has no metadata", self.id)))?;
        let user_id = metadata
            .get("userId")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SapError::InvalidRequest(format!("session {} has no userId", self.id)))?;
        let payment_type: PaymentType = metadata
            .get("type")
            .ok_or_else(|| SapError::InvalidRequest(format!("session {} has no type", self.id)))?
            .parse()
            .map_err(|e| SapError::InvalidRequest(format!("session {}: {e}", self.id)))?;

        #[allow(clippy::cast_precision_loss)]
        let amount = self.amount_total.unwrap_or(0) as f64 / 100.0;

        Ok(PaymentRecord {
            user_id: user_id.clone(),
            payment_type,
            amount,
            external_ref: self.id.clone(),
            timestamp: at,
        })
    }
}

/// Verifies webhook signatures with the shared endpoint secret.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Creates a verifier from configuration.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            tolerance_secs: i64::try_from(config.webhook_tolerance_secs).unwrap_or(i64::MAX),
        }
    }

    /// Verifies `payload` against the signature header.
    ///
    /// `now` is the current unix time in seconds. The payload itself is not
    /// interpreted; see [`WebhookEvent::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`SapError::InvalidSignature`] if no secret is configured, the
    /// header is malformed, the timestamp is outside the tolerance, or no
    /// `v1` signature matches.
    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SapError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| SapError::InvalidSignature("webhook secret not configured".into()))?;

        let (timestamp, signatures) = parse_signature_header(header)?;

        if now.saturating_sub(timestamp).abs() > self.tolerance_secs {
            return Err(SapError::InvalidSignature(format!(
                "timestamp {timestamp} outside tolerance"
            )));
        }

        let expected = compute_signature(secret, timestamp, payload)?;
        let matched = signatures
            .iter()
            .any(|sig| bool::from(expected.as_bytes().ct_eq(sig.as_bytes())));
        if !matched {
            return Err(SapError::InvalidSignature(
                "no matching v1 signature".into(),
            ));
        }

        Ok(())
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"` keyed with `secret`.
///
/// # Errors
///
/// Returns [`SapError::Internal`] if the MAC cannot be keyed.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SapError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| SapError::Internal(format!("hmac key: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds a complete `Stripe-Signature` header value for `payload`.
///
/// # Errors
///
/// Returns [`SapError::Internal`] if the MAC cannot be keyed.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SapError> {
    let sig = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={timestamp},v1={sig}"))
}

fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), SapError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    SapError::InvalidSignature(format!("bad timestamp {value:?}"))
                })?);
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| SapError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(SapError::InvalidSignature("missing v1 signature".into()));
    }
    Ok((timestamp, signatures))
}
