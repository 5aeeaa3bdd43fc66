//! Mock gateway clients for testing
//!
//! These mocks drive the controller without a running gateway.

use super::client::{GatewayClient, GatewayError};
use super::state::Turn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

// ============================================================================
// Mock Gateway Client
// ============================================================================

/// Gateway client that answers from a queue and records every request
pub struct MockGatewayClient {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failed call
    pub fn queue_failure(&self, status: u16, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(GatewayError::Status {
            status,
            message: message.into(),
        }));
    }

    /// Messages sent on each call, oldest first
    pub fn recorded_requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GatewayError::Status {
                    status: 503,
                    message: "No mock reply queued".to_string(),
                })
            })
    }
}

// ============================================================================
// Gated Mock Gateway Client (for in-flight testing)
// ============================================================================

/// Gateway client that holds every call until the test releases it
pub struct GatedGatewayClient {
    reply: String,
    started: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedGatewayClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            started: Notify::new(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait until a call has reached the gateway
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one held call complete
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayClient for GatedGatewayClient {
    async fn send(&self, _messages: &[Turn]) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.reply.clone())
    }
}
