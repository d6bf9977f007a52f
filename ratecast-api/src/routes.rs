//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Exchange rate
        .route("/rate", get(handlers::get_rate))

        // Subscriptions
        .route("/subscribe", post(handlers::subscribe))
        .route("/sendEmails", post(handlers::send_emails))

        .with_state(state)
}
