//! Client-side conversation session
//!
//! A session moves `entering → active → closed` (and back to `active` on
//! resume). The state machine is a pure [`transition`] function; the
//! [`SessionController`] executes its effects against local storage and the
//! gateway.

mod citation;
mod client;
mod controller;
mod effect;
mod event;
mod state;
mod store;
mod transition;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use citation::{split_reply, Reply};
pub use client::{GatewayClient, GatewayError, HttpGatewayClient};
pub use controller::{SessionController, SessionError};
pub use effect::Effect;
pub use event::Event;
pub use state::{Phase, PendingRequest, RequestPurpose, Role, SessionState, Turn};
pub use store::{HistoryStore, SqliteHistoryStore, StoreError, HISTORY_KEY, MAX_STORED_TURNS};
pub use transition::{
    transition, TransitionError, TransitionResult, CLOSING_INSTRUCTION, FALLBACK_CLOSING,
    FALLBACK_GREETING, GREETING_INSTRUCTION, SUBMIT_FAILED,
};
