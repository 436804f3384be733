//! Completion proxy handler.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ANONYMOUS_USER, GenerateRequest, GenerateResponse};
use crate::app_state::AppState;
use crate::domain::{TrackedEvent, estimate_tokens};
use crate::error::{ErrorResponse, SapError};

/// `POST /api/generate`: Track a prompt, then forward it to the
/// completion API.
///
/// # Errors
///
/// Returns [`SapError::InvalidRequest`] on a malformed body,
/// [`SapError::Completion`] when the completion call fails, and
/// [`SapError::EmptyCompletion`] when it returns no choices.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generate",
    summary = "Generate a completion",
    description = "Tracks the prompt with an estimated token count, then proxies it to the configured completion API. A tracking failure does not block generation.",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Completion text and usage", body = GenerateResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Completion failed", body = ErrorResponse),
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, SapError> {
    let Json(req) = payload.map_err(|e| SapError::InvalidRequest(e.body_text()))?;

    let model = req
        .model
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| state.default_model.to_string());
    let user_id = req
        .user_id
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());

    let event = TrackedEvent::new(
        &req.prompt,
        model.as_str(),
        estimate_tokens(&req.prompt),
        user_id,
    );
    if let Err(e) = state.tracking.track(event).await {
        tracing::warn!(error = %e, model = %model, "tracking before generation failed");
    }

    let completion = state.completion.complete(&model, &req.prompt).await?;

    Ok(Json(GenerateResponse {
        response: completion.content,
        usage: completion.usage,
    }))
}

/// Generate routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/generate", post(generate))
}
