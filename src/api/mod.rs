//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Endpoints are mounted at the paths the widget and SDK already call
//! (`/api/...`, `/stripe-webhook`, `/health`); the live feed is at `/ws`.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::domain::{GlobalSnapshot, PaymentRecord, PaymentType, SourceTag};
use crate::error::ErrorResponse;
use crate::ws::handler::ws_handler;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "sap-gateway", description = "Environmental impact tracking for AI prompts"),
    paths(
        handlers::tracking::track_prompt,
        handlers::tracking::get_stats,
        handlers::account::get_user_status,
        handlers::generate::generate,
        handlers::payment::create_checkout_session,
        handlers::payment::stripe_webhook,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::TrackRequest,
        dto::TrackResponse,
        dto::UserStatusResponse,
        dto::GenerateRequest,
        dto::GenerateResponse,
        dto::CheckoutRequest,
        dto::CheckoutResponse,
        dto::WebhookAck,
        handlers::system::HealthResponse,
        GlobalSnapshot,
        PaymentRecord,
        PaymentType,
        SourceTag,
        ErrorResponse,
    )),
    tags(
        (name = "Tracking", description = "Prompt tracking and global totals"),
        (name = "Accounts", description = "Payment-derived user status"),
        (name = "Generate", description = "Completion proxy"),
        (name = "Payments", description = "Checkout and payment webhooks"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router without state or middleware.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}

/// Builds the complete application: REST routes, the `/ws` feed, tracing,
/// timeout and CORS layers, and (with the `swagger-ui` feature) the API docs.
pub fn build_app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(CorsLayer::permissive());

    let router = build_router().route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router.layer(middleware).with_state(state)
}
