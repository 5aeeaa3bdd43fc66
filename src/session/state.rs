//! Session state types

use super::citation::{split_reply, Reply};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Marks the assistant's session-ending remark; presentation only
    #[serde(default, skip_serializing_if = "is_false")]
    pub closing: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip predicate signature
fn is_false(value: &bool) -> bool {
    !*value
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            closing: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            closing: false,
        }
    }

    pub fn closing(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            closing: true,
        }
    }

    /// Main text and citation, derived from `content` on every call
    pub fn reply(&self) -> Reply {
        split_reply(&self.content)
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Before the conversation starts (initial, and after a reset)
    #[default]
    Entering,
    /// Normal conversation
    Active,
    /// Ended; can be resumed
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Entering => "entering",
            Phase::Active => "active",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a gateway request was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    /// Opening greeting for a fresh session
    Greeting,
    /// Answer to a user turn
    Reply,
    /// Closing remark when the session ends
    Closing,
}

/// The single outstanding gateway request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub purpose: RequestPurpose,
}

/// Full session state, owned by one controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub turns: Vec<Turn>,
    /// Set while a gateway request is unresolved
    pub pending: Option<PendingRequest>,
    /// Transient, dismissible error for the front end
    pub error: Option<String>,
    /// Id for the next gateway request; never reset
    pub next_request_id: u64,
}

impl SessionState {
    /// State at process start: persisted turns, not yet entered
    pub fn restored(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            ..Self::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}
