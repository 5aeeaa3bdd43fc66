//! Pure state transition function
//!
//! Given the same state and event it always produces the same result. All
//! I/O is expressed as [`Effect`]s for the controller to carry out.

use super::state::{Phase, PendingRequest, RequestPurpose, SessionState, Turn};
use super::{Effect, Event};
use thiserror::Error;

/// Synthetic instruction asking for an opening greeting
pub const GREETING_INSTRUCTION: &str =
    "Begin the session. Greet me briefly and ask what I am carrying.";

/// Synthetic instruction asking for a closing remark
pub const CLOSING_INSTRUCTION: &str = "The user is ending the session. Offer a brief closing — 2 sentences maximum. Something to carry into the day. Do not say goodbye effusively.";

/// Greeting used when the gateway cannot produce one
pub const FALLBACK_GREETING: &str = "Come. Sit. What is it you are carrying today?";

/// Closing used when the gateway cannot produce one
pub const FALLBACK_CLOSING: &str = "Go well. The practice continues whether you are sitting or not.";

/// Transient error shown after a failed submit
pub const SUBMIT_FAILED: &str = "Something went wrong. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Nothing to send")]
    EmptyInput,
    #[error("A request is already in flight")]
    RequestInFlight,
    #[error("Cannot {action} while the session is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },
}

/// Pure transition function
pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Entering
        // ============================================================

        // An existing conversation resumes silently
        (Phase::Entering, Event::Begin { history }) if !history.is_empty() => {
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Active,
                turns: history,
                error: None,
                ..state.clone()
            }))
        }

        (Phase::Entering, Event::Begin { .. }) => {
            let mut next = SessionState {
                phase: Phase::Active,
                turns: vec![],
                error: None,
                ..state.clone()
            };
            let request_id = issue_request(&mut next, RequestPurpose::Greeting);
            Ok(TransitionResult::new(next).with_effect(Effect::request_gateway(
                request_id,
                vec![Turn::user(GREETING_INSTRUCTION)],
            )))
        }

        (phase, Event::Begin { .. }) => Err(TransitionError::InvalidPhase {
            action: "begin",
            phase,
        }),

        // ============================================================
        // Conversation
        // ============================================================
        (Phase::Active, Event::Submit { .. } | Event::End) if state.is_busy() => {
            Err(TransitionError::RequestInFlight)
        }

        (Phase::Active, Event::Submit { text }) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            let mut next = SessionState {
                error: None,
                ..state.clone()
            };
            next.turns.push(Turn::user(text));
            let request_id = issue_request(&mut next, RequestPurpose::Reply);
            let messages = next.turns.clone();

            Ok(TransitionResult::new(next)
                .with_effect(Effect::PersistHistory)
                .with_effect(Effect::request_gateway(request_id, messages)))
        }

        (phase, Event::Submit { .. }) => Err(TransitionError::InvalidPhase {
            action: "submit",
            phase,
        }),

        (Phase::Active, Event::End) => {
            let mut next = state.clone();
            let request_id = issue_request(&mut next, RequestPurpose::Closing);
            let mut messages = next.turns.clone();
            messages.push(Turn::user(CLOSING_INSTRUCTION));

            Ok(TransitionResult::new(next).with_effect(Effect::request_gateway(request_id, messages)))
        }

        (phase, Event::End) => Err(TransitionError::InvalidPhase {
            action: "end",
            phase,
        }),

        (Phase::Closed, Event::Resume) => Ok(TransitionResult::new(SessionState {
            phase: Phase::Active,
            ..state.clone()
        })),

        (phase, Event::Resume) => Err(TransitionError::InvalidPhase {
            action: "resume",
            phase,
        }),

        // ============================================================
        // Any phase
        // ============================================================

        // Request ids keep counting so a reply to a request issued before
        // the reset is recognised as stale.
        (_, Event::Reset) => Ok(TransitionResult::new(SessionState {
            next_request_id: state.next_request_id,
            ..SessionState::default()
        })
        .with_effect(Effect::ClearHistory)),

        (_, Event::DismissError) => Ok(TransitionResult::new(SessionState {
            error: None,
            ..state.clone()
        })),

        // ============================================================
        // Gateway responses
        //
        // Answers to a request that is no longer outstanding (the session
        // was reset meanwhile) leave the state untouched.
        // ============================================================
        (_, Event::GatewayReply { request_id, text }) => {
            let Some(pending) = matching_request(state, request_id) else {
                return Ok(TransitionResult::new(state.clone()));
            };
            let mut next = SessionState {
                pending: None,
                ..state.clone()
            };
            match pending.purpose {
                RequestPurpose::Greeting | RequestPurpose::Reply => {
                    next.turns.push(Turn::assistant(text));
                }
                RequestPurpose::Closing => {
                    next.turns.push(Turn::closing(text));
                    next.phase = Phase::Closed;
                }
            }
            Ok(TransitionResult::new(next).with_effect(Effect::PersistHistory))
        }

        (_, Event::GatewayFailed { request_id, .. }) => {
            let Some(pending) = matching_request(state, request_id) else {
                return Ok(TransitionResult::new(state.clone()));
            };
            let mut next = SessionState {
                pending: None,
                ..state.clone()
            };
            match pending.purpose {
                RequestPurpose::Greeting => {
                    next.turns.push(Turn::assistant(FALLBACK_GREETING));
                    Ok(TransitionResult::new(next).with_effect(Effect::PersistHistory))
                }
                // The user turn stays; nothing is rolled back
                RequestPurpose::Reply => {
                    next.error = Some(SUBMIT_FAILED.to_string());
                    Ok(TransitionResult::new(next))
                }
                RequestPurpose::Closing => {
                    next.turns.push(Turn::closing(FALLBACK_CLOSING));
                    next.phase = Phase::Closed;
                    Ok(TransitionResult::new(next).with_effect(Effect::PersistHistory))
                }
            }
        }
    }
}

fn issue_request(state: &mut SessionState, purpose: RequestPurpose) -> u64 {
    let id = state.next_request_id;
    state.next_request_id += 1;
    state.pending = Some(PendingRequest { id, purpose });
    id
}

fn matching_request(state: &SessionState, request_id: u64) -> Option<PendingRequest> {
    state.pending.filter(|p| p.id == request_id)
}
