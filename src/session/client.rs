//! Client side of the gateway wire contract

use super::state::{Role, Turn};
use crate::gateway::{ChatRequest, ErrorResponse};
use crate::llm::{LlmMessage, MessageRole};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gateway answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unreadable gateway response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Sends the conversation to the gateway and returns the reply text
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError>;
}

#[async_trait]
impl<T: GatewayClient + ?Sized> GatewayClient for Arc<T> {
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError> {
        (**self).send(messages).await
    }
}

/// HTTP gateway client
pub struct HttpGatewayClient {
    client: Client,
    url: String,
}

impl HttpGatewayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError> {
        let request = ChatRequest {
            messages: messages.iter().map(to_wire).collect(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: Value = serde_json::from_str(&body)?;
        Ok(reply_text(&body))
    }
}

/// Only role and content go over the wire
fn to_wire(turn: &Turn) -> LlmMessage {
    let role = match turn.role {
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
    };
    LlmMessage {
        role,
        content: turn.content.clone(),
    }
}

/// Text of the first content item; a reply without one counts as empty
fn reply_text(body: &Value) -> String {
    body.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
