//! HTTP request handlers

use super::{relay, AppState, RelayError};
use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    routing::{any, get},
    Json, Router,
};
use serde_json::Value;

/// Create the gateway router.
///
/// The relay is mounted twice: once at the serverless-function path the web
/// front end already calls, once under `/api`. Both routes accept any method
/// so that the relay itself answers non-POST requests.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/.netlify/functions/chat", any(chat))
        .route("/api/chat", any(chat))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, RelayError> {
    let result = relay(state.upstream.as_deref(), &state.persona, &method, &body).await;

    if let Err(e) = &result {
        if e.status.is_client_error() {
            tracing::debug!(status = %e.status, error = %e.message, "Rejected relay request");
        } else {
            tracing::warn!(status = %e.status, error = %e.message, "Relay failed");
        }
    }

    result.map(Json)
}

async fn get_version() -> &'static str {
    concat!("kalyana ", env!("CARGO_PKG_VERSION"))
}
