//! Separating a reply's citation block from its main text
//!
//! Replies may end with a citation set off by a line holding only an em-dash.
//! The split is recomputed from the stored content whenever it is needed, so
//! it has to be deterministic and idempotent.

use regex::Regex;
use std::sync::LazyLock;

/// A line holding only an em-dash, with any surrounding whitespace
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*—\s*\n").expect("separator pattern is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("url pattern is valid"));

/// Canonical separator used when extra citation parts are re-joined
const CITATION_JOIN: &str = "\n—\n";

/// A reply split into main text and citation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub main: String,
    /// Empty when the reply carries no citation
    pub citation: String,
}

impl Reply {
    pub fn has_citation(&self) -> bool {
        !self.citation.is_empty()
    }

    /// URLs mentioned in the citation, in order of appearance
    pub fn citation_links(&self) -> Vec<&str> {
        URL.find_iter(&self.citation).map(|m| m.as_str()).collect()
    }

    /// Reassemble in the layout the persona is asked to produce
    pub fn join(&self) -> String {
        if self.has_citation() {
            format!("{}\n\n—\n\n{}", self.main, self.citation)
        } else {
            self.main.clone()
        }
    }
}

/// Split reply text at the first em-dash separator line.
///
/// Everything before the first separator is the main text. Everything after
/// it is the citation; further separators inside the citation are kept,
/// normalized to a bare `—` line.
pub fn split_reply(text: &str) -> Reply {
    let mut parts = SEPARATOR.split(text);
    let main = parts.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = parts.collect();

    if rest.is_empty() {
        return Reply {
            main,
            citation: String::new(),
        };
    }

    Reply {
        main,
        citation: rest.join(CITATION_JOIN).trim().to_string(),
    }
}
