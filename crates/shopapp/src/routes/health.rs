//! Health check handlers.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.health().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
