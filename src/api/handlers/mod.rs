//! REST endpoint handlers organized by resource.

pub mod account;
pub mod generate;
pub mod payment;
pub mod system;
pub mod tracking;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(tracking::routes())
        .merge(account::routes())
        .merge(generate::routes())
        .merge(payment::routes())
        .merge(system::routes())
}
