//! Checkout and webhook DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PaymentType;

/// Request body for `POST /api/create-checkout-session`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Provider price identifier of the single line item.
    pub price_id: String,
    /// Paying user, echoed back in the completion webhook metadata.
    pub user_id: String,
    /// What is being purchased.
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
}

/// Response body for `POST /api/create-checkout-session`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Provider checkout session id.
    pub session_id: String,
}

/// Acknowledgement returned for every verified webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    /// Always `true`.
    pub received: bool,
}
