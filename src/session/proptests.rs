//! Property-based tests for the session
//!
//! These tests verify key invariants hold across all possible inputs.

use super::citation::split_reply;
use super::state::*;
use super::store::{recent, HistoryStore, SqliteHistoryStore, MAX_STORED_TURNS};
use super::transition::*;
use super::{Effect, Event};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_turn() -> impl Strategy<Value = Turn> {
    (
        prop_oneof![Just(Role::User), Just(Role::Assistant)],
        "[a-zA-Z0-9 .,!?\n—]{0,40}",
        any::<bool>(),
    )
        .prop_map(|(role, content, closing)| Turn {
            role,
            content,
            closing: closing && role == Role::Assistant,
        })
}

fn arb_turns(max: usize) -> impl Strategy<Value = Vec<Turn>> {
    proptest::collection::vec(arb_turn(), 0..max)
}

/// Text built from the characters that matter to the citation separator
fn arb_reply_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("a"),
            Just("b."),
            Just(" "),
            Just("\t"),
            Just("\n"),
            Just("—"),
            Just("\n—\n"),
            Just("\n\n—\n\n"),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// How a gateway outcome relates to the outstanding request
#[derive(Debug, Clone)]
enum Answer {
    Current,
    Stale(u64),
}

#[derive(Debug, Clone)]
enum Step {
    Begin(Vec<Turn>),
    Submit(String),
    End,
    Resume,
    Reset,
    DismissError,
    Reply(Answer, String),
    Fail(Answer),
}

fn arb_answer() -> impl Strategy<Value = Answer> {
    prop_oneof![
        3 => Just(Answer::Current),
        1 => (0u64..4).prop_map(Answer::Stale),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        arb_turns(3).prop_map(Step::Begin),
        "[ a-z]{0,6}".prop_map(Step::Submit),
        Just(Step::End),
        Just(Step::Resume),
        Just(Step::Reset),
        Just(Step::DismissError),
        (arb_answer(), "[a-z ]{0,10}").prop_map(|(a, t)| Step::Reply(a, t)),
        arb_answer().prop_map(Step::Fail),
    ]
}

fn answer_id(state: &SessionState, answer: &Answer) -> u64 {
    match answer {
        Answer::Current => state.pending.map_or(u64::MAX, |p| p.id),
        Answer::Stale(id) => *id,
    }
}

fn to_event(state: &SessionState, step: Step) -> Event {
    match step {
        Step::Begin(history) => Event::Begin { history },
        Step::Submit(text) => Event::Submit { text },
        Step::End => Event::End,
        Step::Resume => Event::Resume,
        Step::Reset => Event::Reset,
        Step::DismissError => Event::DismissError,
        Step::Reply(answer, text) => Event::GatewayReply {
            request_id: answer_id(state, &answer),
            text,
        },
        Step::Fail(answer) => Event::GatewayFailed {
            request_id: answer_id(state, &answer),
            message: "failed".to_string(),
        },
    }
}

// ============================================================================
// Persistence
// ============================================================================

proptest! {
    #[test]
    fn prop_save_load_keeps_last_sixty(turns in arb_turns(150)) {
        let store = SqliteHistoryStore::open_in_memory().unwrap();
        store.save(&turns);

        let loaded = store.load();
        let start = turns.len().saturating_sub(MAX_STORED_TURNS);
        prop_assert_eq!(loaded.len(), turns.len().min(MAX_STORED_TURNS));
        prop_assert_eq!(loaded.as_slice(), &turns[start..]);
    }
}

// ============================================================================
// Citation splitting
// ============================================================================

proptest! {
    #[test]
    fn prop_split_is_idempotent(text in arb_reply_text()) {
        let first = split_reply(&text);
        let second = split_reply(&first.join());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_text_without_separator_is_all_main(text in "[a-z .,—]{0,40}") {
        let reply = split_reply(&text);
        prop_assert_eq!(reply.main.as_str(), text.trim());
        prop_assert!(reply.citation.is_empty());
    }

    #[test]
    fn prop_separated_citation_is_found(
        main in "[a-z][a-z .]{0,20}",
        citation in "[A-Za-z0-9][A-Za-z0-9 .]{0,20}",
    ) {
        let reply = split_reply(&format!("{main}\n\n—\n\n{citation}"));
        prop_assert_eq!(reply.main.as_str(), main.trim());
        prop_assert_eq!(reply.citation.as_str(), citation.trim());
        prop_assert!(reply.has_citation());
    }
}

// ============================================================================
// State machine
// ============================================================================

proptest! {
    #[test]
    fn prop_state_machine_invariants(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = SessionState::default();
        let mut stored: Vec<Turn> = Vec::new();

        for step in steps {
            let resets = matches!(step, Step::Reset);
            let begins = matches!(step, Step::Begin(_));
            let event = to_event(&state, step);

            match transition(&state, event) {
                Ok(result) => {
                    let next = result.new_state;

                    // Turns only ever grow, except on reset and begin
                    if !resets && !begins {
                        prop_assert!(next.turns.starts_with(&state.turns));
                        prop_assert!(next.turns.len() <= state.turns.len() + 1);
                    }
                    prop_assert!(next.next_request_id >= state.next_request_id);

                    for effect in &result.effects {
                        match effect {
                            Effect::PersistHistory => stored = recent(&next.turns).to_vec(),
                            Effect::ClearHistory => stored.clear(),
                            Effect::RequestGateway { request_id, .. } => {
                                prop_assert_eq!(next.pending.map(|p| p.id), Some(*request_id));
                            }
                        }
                    }

                    if resets {
                        prop_assert!(next.turns.is_empty());
                        prop_assert!(stored.is_empty());
                    }
                    state = next;
                }
                Err(TransitionError::RequestInFlight) => {
                    prop_assert!(state.is_busy());
                }
                Err(TransitionError::EmptyInput) => {
                    prop_assert_eq!(state.phase, Phase::Active);
                }
                Err(TransitionError::InvalidPhase { phase, .. }) => {
                    prop_assert_eq!(phase, state.phase);
                }
            }

            // A request is only ever outstanding in an active session
            if state.is_busy() {
                prop_assert_eq!(state.phase, Phase::Active);
            }
            prop_assert!(stored.len() <= MAX_STORED_TURNS);
            // Storage is always a suffix of the conversation
            prop_assert!(state.turns.ends_with(&stored));
            if state.phase == Phase::Entering {
                prop_assert!(state.turns.is_empty() && stored.is_empty());
            }
        }
    }

    #[test]
    fn prop_closing_turns_only_close(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = SessionState::default();
        for step in steps {
            // Restored history may already end in a closing turn
            let step = match step {
                Step::Begin(_) => Step::Begin(vec![]),
                other => other,
            };
            let event = to_event(&state, step);
            if let Ok(result) = transition(&state, event) {
                let added = result.new_state.turns.len() > state.turns.len()
                    && result.new_state.turns.starts_with(&state.turns);
                if added && result.new_state.turns.last().is_some_and(|t| t.closing) {
                    prop_assert_eq!(result.new_state.phase, Phase::Closed);
                }
                state = result.new_state;
            }
        }
    }
}
