//! Completion proxy DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Prompt forwarded to the completion API.
    pub prompt: String,
    /// Model name; the configured default is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// User the prompt is attributed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    /// Text of the first completion choice.
    pub response: String,
    /// Provider usage block, passed through unchanged.
    #[schema(value_type = Option<Object>)]
    pub usage: Option<serde_json::Value>,
}
