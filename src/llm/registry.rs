//! Upstream configuration and service construction

use super::{
    AnthropicService, LlmError, LlmService, LoggingService, DEFAULT_MODEL, DEFAULT_UPSTREAM_URL,
};
use std::sync::Arc;

/// Configuration for the upstream provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// Model name sent upstream; defaults to [`DEFAULT_MODEL`]
    pub model: Option<String>,
    /// Messages endpoint; defaults to [`DEFAULT_UPSTREAM_URL`]
    pub upstream_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("KALYANA_MODEL").ok(),
            upstream_url: std::env::var("KALYANA_UPSTREAM_URL").ok(),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn upstream_url(&self) -> &str {
        self.upstream_url.as_deref().unwrap_or(DEFAULT_UPSTREAM_URL)
    }
}

/// Build the upstream service, wrapped with logging.
///
/// Returns `Ok(None)` when no usable credential is configured. The gateway
/// keeps running in that case and answers every relay with a configuration
/// error. A configured credential whose client cannot be built is an error.
pub fn build_upstream(config: &LlmConfig) -> Result<Option<Arc<dyn LlmService>>, LlmError> {
    let Some(api_key) = config
        .anthropic_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    else {
        return Ok(None);
    };

    let service = AnthropicService::new(api_key, config.model(), config.upstream_url())?;
    Ok(Some(Arc::new(LoggingService::new(Arc::new(service)))))
}
