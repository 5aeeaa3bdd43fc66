//! Events that drive the session state machine

use super::state::Turn;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// Enter the session; `history` is what local storage holds right now
    Begin { history: Vec<Turn> },
    Submit { text: String },
    End,
    Resume,
    Reset,
    DismissError,

    // Gateway events
    GatewayReply { request_id: u64, text: String },
    GatewayFailed { request_id: u64, message: String },
}
