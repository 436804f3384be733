//! User status handler.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::UserStatusResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SapError};

/// `GET /api/user/{userId}`: Payment-derived status of one user.
///
/// # Errors
///
/// Returns [`SapError::Persistence`] if the payment history cannot be read.
#[utoipa::path(
    get,
    path = "/api/user/{userId}",
    tag = "Accounts",
    summary = "User status",
    description = "Derives stamp, membership and credit balance from the user's full payment history. Unknown users have an empty history.",
    params(
        ("userId" = String, Path, description = "User identifier"),
    ),
    responses(
        (status = 200, description = "Derived status and history", body = UserStatusResponse),
        (status = 500, description = "Payment history unavailable", body = ErrorResponse),
    )
)]
pub async fn get_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStatusResponse>, SapError> {
    let account = state.accounts.user_account(&user_id).await?;
    Ok(Json(account.into()))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/user/{userId}", get(get_user_status))
}
