//! API-key check for the trigger routes
//!
//! `POST /run` and the schedule routes mutate the schedule record, so they
//! sit behind a shared-secret check. Keys come from `[http] api_keys` in the
//! config; an empty list leaves the API open, the default for a
//! localhost-only listener.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::types::ErrorResponse;

/// Configured API keys, shared with the middleware
#[derive(Clone)]
pub struct AuthState {
    keys: Arc<Vec<String>>,
}

impl AuthState {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    /// Whether the presented key (if any) grants access. An empty key list
    /// disables the check entirely.
    fn accepts(&self, presented: Option<&str>) -> bool {
        if self.keys.is_empty() {
            return true;
        }
        match presented {
            Some(key) => self.keys.iter().any(|k| k == key),
            None => false,
        }
    }
}

/// Middleware guarding the trigger routes.
///
/// The key is read from the `Authorization` header, with or without a
/// `Bearer ` prefix.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim());

    if auth.accepts(presented) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::unauthorized()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn default_config_leaves_api_open() {
        let auth = AuthState::new(HttpConfig::default().api_keys);
        assert!(auth.accepts(None));
        assert!(auth.accepts(Some("anything")));
    }

    #[test]
    fn configured_keys_are_required() {
        let auth = AuthState::new(vec!["trigger-key".to_string(), "backup-key".to_string()]);
        assert!(auth.accepts(Some("trigger-key")));
        assert!(auth.accepts(Some("backup-key")));
        assert!(!auth.accepts(Some("wrong")));
        assert!(!auth.accepts(None));
    }
}
