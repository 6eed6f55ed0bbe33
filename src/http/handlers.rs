//! HTTP API Request Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, error, info};

use super::types::{ErrorResponse, HealthResponse, SetEnabledRequest};
use crate::orchestrator::{Orchestrator, RunError};
use crate::schedule::{ScheduleStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<ScheduleStore>,
}

/// Health check (unauthenticated)
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Trigger a run now.
///
/// Returns the run report for runs that reached a terminal state — a failed
/// run is a 200 whose payload carries `status: "failed"` and the error. Only
/// trigger rejections map to non-success codes.
pub async fn trigger_run(State(state): State<AppState>) -> impl IntoResponse {
    info!("HTTP run trigger received");

    match state.orchestrator.run_now().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(RunError::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "ALREADY_RUNNING",
                "A run is already in progress; trigger ignored",
            )),
        )
            .into_response(),
        Err(RunError::Disabled) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(
                "SCHEDULE_DISABLED",
                "The schedule is disabled",
            )),
        )
            .into_response(),
        Err(RunError::Store(e)) => {
            error!("Run trigger failed on schedule store: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Current schedule record for dashboards and operators
pub async fn get_schedule(State(state): State<AppState>) -> impl IntoResponse {
    debug!("HTTP schedule snapshot request");
    Json(state.store.snapshot())
}

/// Administrative enable/disable toggle
pub async fn set_enabled(
    State(state): State<AppState>,
    Json(request): Json<SetEnabledRequest>,
) -> impl IntoResponse {
    info!("HTTP schedule enabled={} request", request.enabled);

    let revision = state.store.snapshot().revision;
    match state.store.update(revision, |s| s.enabled = request.enabled) {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => {
            error!("Could not update schedule enabled flag: {}", e);
            (update_error_status(&e), Json(update_error_payload(&e))).into_response()
        }
    }
}

/// Only a lost revision race is the caller's problem; everything else is ours.
fn update_error_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::RevisionConflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn update_error_payload(e: &StoreError) -> ErrorResponse {
    match e {
        StoreError::RevisionConflict { .. } => {
            ErrorResponse::new("UPDATE_CONFLICT", e.to_string())
        }
        _ => ErrorResponse::internal_error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_conflict_maps_to_conflict_status() {
        let e = StoreError::RevisionConflict {
            expected: 1,
            found: 2,
        };
        assert_eq!(update_error_status(&e), StatusCode::CONFLICT);
        assert_eq!(update_error_payload(&e).error, "UPDATE_CONFLICT");
    }

    #[test]
    fn io_failure_maps_to_internal_error() {
        let e = StoreError::Io(std::io::Error::other("disk full"));
        assert_eq!(update_error_status(&e), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(update_error_payload(&e).error, "INTERNAL_ERROR");
    }
}
