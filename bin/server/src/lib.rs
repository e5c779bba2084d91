//! hirepath web server.
//!
//! Serves the post-authentication routes of the recruitment dashboard:
//! login initiation, the provider callback, and the sign-in error page.

pub mod auth;
pub mod config;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::AppState;

/// Builds the router with all routes and middleware.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/auth-code-error", get(auth::auth_code_error))
        .route("/health", get(auth::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
