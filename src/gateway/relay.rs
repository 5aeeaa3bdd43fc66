//! The single relay operation behind every chat route

use super::ErrorResponse;
use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Output cap for every upstream completion
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

const MISSING_CREDENTIAL: &str =
    "API key not configured. Set ANTHROPIC_API_KEY in the environment.";

/// A relay failure, carrying the status to answer with
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RelayError {
    pub status: StatusCode,
    pub message: String,
}

impl RelayError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    pub fn missing_credential() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_CREDENTIAL)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<LlmError> for RelayError {
    /// Upstream failures keep the upstream status; failures that never got
    /// an answer become 500.
    fn from(err: LlmError) -> Self {
        let status = err
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.message)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// Forward one conversation to the upstream with the persona attached.
///
/// Checks run in order: method, credential, JSON body, `messages` array.
/// On success the upstream body is returned untouched.
pub async fn relay(
    upstream: Option<&dyn LlmService>,
    persona: &str,
    method: &Method,
    body: &[u8],
) -> Result<Value, RelayError> {
    if method != Method::POST {
        return Err(RelayError::method_not_allowed());
    }

    let Some(upstream) = upstream else {
        return Err(RelayError::missing_credential());
    };

    let messages = parse_messages(body)?;

    let request = LlmRequest {
        system: persona.to_string(),
        messages,
        max_tokens: MAX_OUTPUT_TOKENS,
    };

    let response = upstream.complete(&request).await?;
    Ok(response.body)
}

fn parse_messages(body: &[u8]) -> Result<Vec<LlmMessage>, RelayError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|_| RelayError::bad_request("Invalid JSON"))?;

    let Some(items) = payload.get("messages").and_then(Value::as_array) else {
        return Err(RelayError::bad_request("messages array required"));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            LlmMessage::deserialize(item)
                .map_err(|e| RelayError::bad_request(format!("invalid message at index {index}: {e}")))
        })
        .collect()
}
