//! Session controller: runs the state machine against real I/O
//!
//! The controller owns the one [`SessionState`] of a client. Every operation
//! feeds an [`Event`] through [`transition`], executes the resulting effects,
//! and, when a gateway request was issued, awaits it and feeds the outcome
//! back in. The state lock is never held across an await, so a second
//! operation arriving mid-request sees the pending request and is refused.

use super::client::GatewayClient;
use super::state::{Phase, SessionState, Turn};
use super::store::HistoryStore;
use super::transition::{transition, TransitionError, TransitionResult};
use super::{Effect, Event};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors reported to the caller of a controller operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Blank input; front ends ignore this silently
    #[error("Nothing to send")]
    EmptyInput,
    /// Another request is outstanding; front ends ignore this silently
    #[error("A request is already in flight")]
    RequestInFlight,
    #[error("Cannot {action} while the session is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },
    /// The gateway call failed; the session records a dismissible error
    #[error("Gateway failure: {0}")]
    GatewayFailure(String),
}

impl SessionError {
    /// Errors a front end should not show to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::RequestInFlight)
    }
}

impl From<TransitionError> for SessionError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::EmptyInput => Self::EmptyInput,
            TransitionError::RequestInFlight => Self::RequestInFlight,
            TransitionError::InvalidPhase { action, phase } => Self::InvalidPhase { action, phase },
        }
    }
}

/// A gateway request issued by a transition
struct GatewayCall {
    request_id: u64,
    messages: Vec<Turn>,
}

/// Owner of one client's conversation
pub struct SessionController<S, G> {
    state: Mutex<SessionState>,
    store: S,
    gateway: G,
}

impl<S: HistoryStore, G: GatewayClient> SessionController<S, G> {
    /// Reconstruct the session from persisted storage
    pub fn open(store: S, gateway: G) -> Self {
        let turns = store.load();
        tracing::debug!(turns = turns.len(), "Restored session history");
        Self {
            state: Mutex::new(SessionState::restored(turns)),
            store,
            gateway,
        }
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Enter the session.
    ///
    /// Restores stored history if there is any, otherwise asks the gateway
    /// for a greeting. A failed greeting is replaced by a canned one, so
    /// this only fails when the session was already entered.
    pub async fn begin(&self) -> Result<(), SessionError> {
        let history = self.store.load();
        let call = self.apply(Event::Begin { history })?;
        self.dispatch(call).await;
        Ok(())
    }

    /// Send a user turn and wait for the reply.
    ///
    /// The user turn is stored before the gateway is called and stays even
    /// when the call fails.
    pub async fn submit(&self, text: &str) -> Result<(), SessionError> {
        let call = self.apply(Event::Submit {
            text: text.to_string(),
        })?;
        match self.dispatch(call).await {
            Some(failure) => Err(SessionError::GatewayFailure(failure)),
            None => Ok(()),
        }
    }

    /// Ask for a closing remark and close the session.
    ///
    /// The session closes whether or not the gateway answers.
    pub async fn end(&self) -> Result<(), SessionError> {
        let call = self.apply(Event::End)?;
        self.dispatch(call).await;
        Ok(())
    }

    /// Reopen a closed session without touching its turns
    pub fn resume(&self) -> Result<(), SessionError> {
        self.apply(Event::Resume).map(|_| ())
    }

    /// Forget everything and return to the entrance
    pub fn reset(&self) {
        // Accepted in every phase and never issues a request
        let _ = self.apply(Event::Reset);
    }

    pub fn dismiss_error(&self) {
        let _ = self.apply(Event::DismissError);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: Event) -> Result<Option<GatewayCall>, SessionError> {
        let mut state = self.lock();
        let result = transition(&state, event)?;
        Ok(self.commit(&mut state, result))
    }

    /// Install the new state and run its local effects
    fn commit(&self, state: &mut SessionState, result: TransitionResult) -> Option<GatewayCall> {
        *state = result.new_state;

        let mut call = None;
        for effect in result.effects {
            match effect {
                Effect::PersistHistory => self.store.save(&state.turns),
                Effect::ClearHistory => self.store.clear(),
                Effect::RequestGateway {
                    request_id,
                    messages,
                } => {
                    call = Some(GatewayCall {
                        request_id,
                        messages,
                    });
                }
            }
        }
        call
    }

    /// Run the gateway request, if any, and feed its outcome back.
    ///
    /// Returns the failure message when a still-current request failed.
    async fn dispatch(&self, call: Option<GatewayCall>) -> Option<String> {
        let GatewayCall {
            request_id,
            messages,
        } = call?;

        match self.gateway.send(&messages).await {
            Ok(text) => {
                self.settle(request_id, Event::GatewayReply { request_id, text });
                None
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(request_id, error = %message, "Gateway request failed");
                let current = self.settle(
                    request_id,
                    Event::GatewayFailed {
                        request_id,
                        message: message.clone(),
                    },
                );
                current.then_some(message)
            }
        }
    }

    /// Apply a gateway outcome; returns false if the request was abandoned
    fn settle(&self, request_id: u64, event: Event) -> bool {
        let mut state = self.lock();
        if state.pending.map(|p| p.id) != Some(request_id) {
            tracing::debug!(request_id, "Dropping answer to abandoned request");
            return false;
        }
        match transition(&state, event) {
            Ok(result) => {
                self.commit(&mut state, result);
                true
            }
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Gateway outcome rejected");
                false
            }
        }
    }
}
