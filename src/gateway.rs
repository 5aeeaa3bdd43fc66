//! HTTP gateway relaying conversation turns to the upstream model
//!
//! The gateway is stateless: every request carries the full conversation,
//! gets the persona attached, and is forwarded exactly once.

mod handlers;
mod relay;
mod types;

pub use handlers::create_router;
pub use relay::{relay, RelayError, MAX_OUTPUT_TOKENS};
pub use types::*;

use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when no credential is configured
    pub upstream: Option<Arc<dyn LlmService>>,
    pub persona: Arc<str>,
}

impl AppState {
    pub fn new(upstream: Option<Arc<dyn LlmService>>, persona: Arc<str>) -> Self {
        Self { upstream, persona }
    }
}
