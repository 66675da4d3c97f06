//! Query/filter synchronization engine.
//!
//! This module holds the machinery behind [`crate::SearchSession`]. It is
//! split into focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! Incoming and outgoing sync share the tokenizer and the rule table:
//!
//! ```text
//! options + settings ──▶ CompiledRules::new      (compiled_rules.rs)
//!                               │
//! query ── tokenize ────────────┼──▶ extract ──▶ StructuredFilters
//!          (tokenizer.rs)       │    (extract.rs, uses a CategoryResolver)
//!                               │
//! edited field ─────────────────┴──▶ serialize ──▶ new query
//!                                    (serialize.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `tokenizer.rs`: splits a query into [`Block`]s and re-joins them.
//! - `compiled_rules.rs`: the per-session rule table (match/strip/reject
//!   patterns per filter) and first-match block lookup.
//! - `extract.rs`: one full incoming pass; reports changed fields.
//! - `serialize.rs`: one outgoing edit for a single filter.
//!
//! ## Adding a filter
//!
//! - Add a `Filter` variant and a `FilterSet` bit in `lib.rs`.
//! - Add its rule in `CompiledRules::new`.
//! - Teach `extract::apply_rule` how to normalize the payload and
//!   `serialize::render` how to write it back; the pair must round-trip.
//!
//! ## Debugging
//!
//! Both directions emit `tracing` events at `debug` level (field changes and
//! block edits) and `trace` level (tokenization).

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/extract.rs"]
mod extract;
#[path = "engine/serialize.rs"]
mod serialize;
#[path = "engine/tokenizer.rs"]
mod tokenizer;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use compiled_rules::CompiledRules;
pub(crate) use extract::extract;
pub(crate) use serialize::serialize;
pub use tokenizer::{Block, tokenize};
