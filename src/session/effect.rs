//! Effects produced by state transitions

use super::state::Turn;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Mirror the current turns to local storage
    PersistHistory,

    /// Remove the stored history
    ClearHistory,

    /// Send `messages` to the gateway; the answer comes back as an event
    /// tagged with `request_id`
    RequestGateway { request_id: u64, messages: Vec<Turn> },
}

impl Effect {
    pub fn request_gateway(request_id: u64, messages: Vec<Turn>) -> Self {
        Effect::RequestGateway {
            request_id,
            messages,
        }
    }
}
