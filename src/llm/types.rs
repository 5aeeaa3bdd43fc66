//! Common types for upstream model interactions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upstream completion request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Opaque persona text, forwarded as the system prompt
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: u32,
}

/// Message in conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Upstream response.
///
/// `body` is the upstream JSON exactly as received; the gateway relays it
/// verbatim. The remaining fields are decoded from it for logging.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub body: Value,
    pub usage: Usage,
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub(crate) fn from_body(body: &Value) -> Self {
        let usage = body.get("usage");
        let field = |name: &str| {
            usage
                .and_then(|u| u.get(name))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        Self {
            input_tokens: field("input_tokens"),
            output_tokens: field("output_tokens"),
        }
    }
}
