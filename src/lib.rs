use regex::Regex;

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;
mod model;
pub mod registry;
mod resolve;

pub use api::{CategoryListener, FilterEdit, QueryListener, SearchSession, SessionSettings};
pub use config::SyncConfig;
pub use engine::{Block, CompiledRules, tokenize};
pub use error::{ConfigError, RegistryError};
pub use model::{CategoryRef, PostTime, SpecialIn, SpecialInFlags, Status, StructuredFilters, When};
pub use registry::{OptionExtensions, SearchOptions};
pub use resolve::{CategoryCatalog, CategoryResolver};

// --- Filters -----------------------------------------------------------------

/// A named structured field that maps to one block of the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Username,
    Category,
    Tags,
    In,
    SpecialIn(SpecialIn),
    Status,
    MinPostCount,
    PostTime,
}

impl Filter {
    pub fn flag(self) -> FilterSet {
        match self {
            Filter::Username => FilterSet::USERNAME,
            Filter::Category => FilterSet::CATEGORY,
            Filter::Tags => FilterSet::TAGS,
            Filter::In => FilterSet::IN,
            Filter::SpecialIn(SpecialIn::Title) => FilterSet::IN_TITLE,
            Filter::SpecialIn(SpecialIn::Likes) => FilterSet::IN_LIKES,
            Filter::SpecialIn(SpecialIn::Personal) => FilterSet::IN_PERSONAL,
            Filter::SpecialIn(SpecialIn::Seen) => FilterSet::IN_SEEN,
            Filter::Status => FilterSet::STATUS,
            Filter::MinPostCount => FilterSet::MIN_POST_COUNT,
            Filter::PostTime => FilterSet::POST_TIME,
        }
    }
}

bitflags::bitflags! {
    /// Which model fields an extraction pass changed.
    ///
    /// An empty set means the pass was a no-op, which is what makes feeding a
    /// serialized string back into the session loop-free.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FilterSet: u16 {
        const USERNAME       = 1 << 0;
        const CATEGORY       = 1 << 1;
        const TAGS           = 1 << 2;
        const ALL_TAGS       = 1 << 3;
        const IN             = 1 << 4;
        const IN_TITLE       = 1 << 5;
        const IN_LIKES       = 1 << 6;
        const IN_PERSONAL    = 1 << 7;
        const IN_SEEN        = 1 << 8;
        const STATUS         = 1 << 9;
        const MIN_POST_COUNT = 1 << 10;
        const POST_TIME      = 1 << 11;
    }
}

/// Byte span of a block in the query string it was tokenized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

// --- Rules -------------------------------------------------------------------

/// A regex used by a rule: either a static compiled via the `regex!` macro in
/// `src/macros.rs`, or one built at session construction from the option
/// registry (the `in:` and `status:` value lists).
#[derive(Debug, Clone)]
pub(crate) enum Pattern {
    Static(&'static Regex),
    Compiled(Regex),
}

impl Pattern {
    pub fn regex(&self) -> &Regex {
        match self {
            Pattern::Static(re) => *re,
            Pattern::Compiled(re) => re,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

/// One entry of the filter rule table.
///
/// - `pattern` decides whether a block belongs to `filter`.
/// - `reject` vetoes blocks the pattern would otherwise claim (a `#name::tag`
///   block looks like a category but is a tag).
/// - `strip` removes the prefix (and any suffix) to leave the payload. When
///   absent the rule has no payload: presence alone is the value.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub name: &'static str,
    pub filter: Filter,
    pub pattern: Pattern,
    pub strip: Option<Pattern>,
    pub reject: Option<Pattern>,
}

impl Rule {
    pub fn matches(&self, block: &str) -> bool {
        self.pattern.is_match(block) && !self.reject.as_ref().is_some_and(|r| r.is_match(block))
    }

    /// The block's payload with the rule's prefix/suffix removed.
    pub fn payload<'b>(&self, block: &'b str) -> std::borrow::Cow<'b, str> {
        match &self.strip {
            Some(strip) => strip.regex().replace_all(block, ""),
            None => std::borrow::Cow::Borrowed(""),
        }
    }
}
