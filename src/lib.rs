//! Kalyana - a persona-carrying conversation relay
//!
//! The crate has two halves. The [`gateway`] is a stateless HTTP service
//! that attaches the persona to a conversation and forwards it to the
//! upstream model. The [`session`] side is the client: a conversation state
//! machine with local history that talks to the gateway.

pub mod config;
pub mod gateway;
pub mod llm;
pub mod persona;
pub mod session;
