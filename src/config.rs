//! Environment-driven configuration for both binaries

use crate::llm::LlmConfig;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8888;
const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8888/api/chat";

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    /// Optional file replacing the embedded persona
    pub persona_path: Option<PathBuf>,
    pub llm: LlmConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("KALYANA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            persona_path: std::env::var_os("KALYANA_PERSONA_PATH").map(PathBuf::from),
            llm: LlmConfig::from_env(),
        }
    }
}

/// Terminal client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub gateway_url: String,
    pub db_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let gateway_url = std::env::var("KALYANA_GATEWAY_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());

        let db_path = std::env::var_os("KALYANA_DB_PATH").map_or_else(
            || {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".kalyana").join("history.db")
            },
            PathBuf::from,
        );

        Self {
            gateway_url,
            db_path,
        }
    }
}
