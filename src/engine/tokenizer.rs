//! Query tokenization.
//!
//! A query string is a sequence of *blocks*: maximal runs of non-whitespace
//! characters, where a double-quoted run is kept whole even if it contains
//! whitespace.
//!
//! ```text
//! hello "big world"x #general
//! └───┘ └──────────────┘ └──────┘
//!   0          1            2
//! ```
//!
//! A quote with no closing partner is an ordinary character of its block, so
//! re-joining the blocks never drops input text. The block pattern is run by
//! the `regex` crate's automaton, which keeps tokenization linear in the input
//! length however many quotes it contains.

use crate::Range;

/// A whitespace-delimited block of the query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub text: String,
    pub range: Range,
}

impl Block {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for Block {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Split `input` into its ordered, non-empty blocks.
///
/// # Example
/// ```
/// let blocks = querysync::tokenize("hello world #general @sam");
/// let texts: Vec<&str> = blocks.iter().map(|b| b.as_str()).collect();
/// assert_eq!(texts, ["hello", "world", "#general", "@sam"]);
/// ```
pub fn tokenize(input: &str) -> Vec<Block> {
    let blocks: Vec<Block> = regex!(r#"(?:[^"\s]+|"[^"]*"|")+"#)
        .find_iter(input)
        .map(|m| Block { text: m.as_str().to_string(), range: Range { start: m.start(), end: m.end() } })
        .collect();

    tracing::trace!(count = blocks.len(), "tokenized query");
    blocks
}

/// Re-join block texts into a canonical query string.
pub(crate) fn join<S: AsRef<str>>(blocks: &[S]) -> String {
    let parts: Vec<&str> = blocks.iter().map(|b| b.as_ref()).filter(|b| !b.is_empty()).collect();
    parts.join(" ").trim().to_string()
}
