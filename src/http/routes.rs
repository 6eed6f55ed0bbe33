//! HTTP API Route Definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    // Protected routes
    let protected = Router::new()
        .route("/run", post(handlers::trigger_run))
        .route("/schedule", get(handlers::get_schedule))
        .route("/schedule/enabled", post(handlers::set_enabled))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(app_state);

    // Health check stays reachable without a key for liveness probes
    let public = Router::new().route("/health", get(handlers::health));

    // Mount under /api/v1
    Router::new().nest("/api/v1", public.merge(protected))
}
