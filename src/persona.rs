//! Persona text injected as the upstream system prompt
//!
//! The persona is opaque data: it is loaded once at startup and forwarded
//! as-is, never inspected.

use std::path::Path;
use std::sync::Arc;

/// Persona bundled with the binary
const EMBEDDED_PERSONA: &str = include_str!("../assets/persona.md");

/// Load the persona, preferring an override file when one is configured.
///
/// A configured override that cannot be read is an error; there is no
/// fallback to the embedded text.
pub fn load_persona(override_path: Option<&Path>) -> std::io::Result<Arc<str>> {
    let text = match override_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => EMBEDDED_PERSONA.to_string(),
    };
    Ok(Arc::from(text.trim()))
}
