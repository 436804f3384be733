//! Tracking and snapshot handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{TrackRequest, TrackResponse};
use crate::app_state::AppState;
use crate::domain::GlobalSnapshot;
use crate::error::{ErrorResponse, SapError};

/// `POST /api/track`: Record one prompt and return the new totals.
///
/// # Errors
///
/// Returns [`SapError::InvalidTrackingRequest`] on a malformed body or
/// negative amounts, and [`SapError::TrackingFailed`] when strict
/// persistence refuses the update.
#[utoipa::path(
    post,
    path = "/api/track",
    tag = "Tracking",
    summary = "Track a prompt",
    description = "Estimates the energy and CO2 of one prompt from its token count (or the measured values supplied), adds it to the global totals and returns them.",
    request_body = TrackRequest,
    responses(
        (status = 200, description = "Prompt tracked", body = TrackResponse),
        (status = 400, description = "Malformed body or negative amounts", body = ErrorResponse),
        (status = 500, description = "Prompt could not be recorded", body = ErrorResponse),
    )
)]
pub async fn track_prompt(
    State(state): State<AppState>,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, SapError> {
    let Json(req) = payload.map_err(|e| SapError::InvalidTrackingRequest(e.body_text()))?;
    let event = req.into_event()?;
    let stats = state.tracking.track(event).await?;

    Ok(Json(TrackResponse {
        success: true,
        stats,
    }))
}

/// `GET /api/stats`: Current global totals.
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Tracking",
    summary = "Global totals",
    description = "Returns the latest durable snapshot, or the in-memory totals when the store is unavailable or empty.",
    responses(
        (status = 200, description = "Current totals", body = GlobalSnapshot),
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<GlobalSnapshot> {
    Json(state.tracking.snapshot().await)
}

/// Tracking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/track", post(track_prompt))
        .route("/api/stats", get(get_stats))
}
