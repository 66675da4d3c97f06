//! The filter rule table.
//!
//! Every supported filter token is described by one [`Rule`]: a match pattern,
//! an optional veto pattern, and a strip pattern that leaves the payload. The
//! table is *data*; extraction and serialization both walk it instead of
//! hard-coding per-filter conditionals.
//!
//! Most patterns are static. The `in:`/`with:`, `status:` and post-time rules
//! depend on the sealed option lists (and on whether a user is signed in), so
//! a session compiles its own table once, at construction.
//!
//! | rule               | match                                | strip                     |
//! |--------------------|--------------------------------------|---------------------------|
//! | username           | `user:` / `@`                        | same                      |
//! | category           | `category:` / `#` (not `#x::tag`)    | same                      |
//! | tags               | `tag:` / `tags:` / `#x::tag`         | prefix and `::tag` suffix |
//! | in                 | `in:`/`with:` + option value         | `in:` / `with:`           |
//! | in:likes ... seen  | exact token                          | (none)                    |
//! | status             | `status:` + option value             | `status:`                 |
//! | post time          | `before:` / `after:` (+ registered)  | same                      |
//! | min post count     | `min_post_count:`                    | same                      |
//!
//! ## Invariants
//!
//! - Rule order is extraction order; it never affects results because each
//!   rule writes a distinct model field.
//! - Option values are `regex::escape`d, so registered values cannot inject
//!   pattern syntax.

use crate::api::SessionSettings;
use crate::registry::SearchOptions;
use crate::{Block, Filter, Pattern, Rule, SpecialIn};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// A session's compiled rule table.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub(crate) rules: Vec<Rule>,
    pub(crate) options: Arc<SearchOptions>,
}

impl CompiledRules {
    /// Build the rule table for `settings` from the sealed `options`.
    ///
    /// With tagging disabled the tags rule is left out entirely, so tag blocks
    /// are neither extracted nor rewritten.
    pub fn new(options: Arc<SearchOptions>, settings: &SessionSettings) -> Result<Self, regex::Error> {
        let in_values = options.in_values(settings.current_user_present);
        let status_values: Vec<&str> = options.status_options.iter().map(String::as_str).collect();
        let when_values: Vec<&str> = options.post_time_options.iter().map(String::as_str).collect();

        let mut rules = vec![
            rule! {
                name: "username",
                filter: Filter::Username,
                pattern: re!(r"(?i)^(?:user:|@)"),
                strip: re!(r"(?i)^(?:user:|@)"),
            },
            rule! {
                name: "category",
                filter: Filter::Category,
                pattern: re!(r"(?i)^(?:category:|#)"),
                strip: re!(r"(?i)^(?:category:|#)"),
                reject: re!(r"(?i)^#[a-z0-9\-]+::tag$"),
            },
        ];

        if settings.tagging_enabled {
            rules.push(rule! {
                name: "tags",
                filter: Filter::Tags,
                pattern: re!(r"(?i)^(?:tags?:|#[a-z0-9\-]+::tag$)"),
                strip: re!(r"(?i)^(?:tags?:|#)|::tag$"),
            });
        }

        rules.push(rule! {
            name: "in",
            filter: Filter::In,
            pattern: Pattern::Compiled(one_of(r"^(?:in|with):", &in_values, "$")?),
            strip: re!(r"(?i)^(?:in|with):"),
        });

        rules.extend(SpecialIn::ALL.into_iter().map(special_in_rule));

        rules.push(rule! {
            name: "status",
            filter: Filter::Status,
            pattern: Pattern::Compiled(one_of(r"^status:", &status_values, "$")?),
            strip: re!(r"(?i)^status:"),
        });

        // The keyword is captured (group 1) so extraction can read `when`.
        let post_time = Pattern::Compiled(one_of("^", &when_values, ":")?);
        rules.push(rule! {
            name: "post_time",
            filter: Filter::PostTime,
            pattern: post_time.clone(),
            strip: post_time,
        });

        rules.push(rule! {
            name: "min_post_count",
            filter: Filter::MinPostCount,
            pattern: re!(r"(?i)^min_post_count:"),
            strip: re!(r"(?i)^min_post_count:"),
        });

        tracing::debug!(rules = rules.len(), in_values = in_values.len(), "compiled filter rules");
        Ok(CompiledRules { rules, options })
    }

    /// The rule for `filter`, if the session has one.
    pub(crate) fn get(&self, filter: Filter) -> Option<&Rule> {
        self.rules.iter().find(|r| r.filter == filter)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Whether the rule for `filter` would claim `text` as its block.
    pub(crate) fn accepts(&self, filter: Filter, text: &str) -> bool {
        self.get(filter).is_some_and(|rule| rule.matches(text))
    }

    /// Index of the first block claimed by `rule` (first match wins).
    pub(crate) fn locate<S: AsRef<str>>(rule: &Rule, blocks: &[S]) -> Option<usize> {
        blocks.iter().position(|b| rule.matches(b.as_ref()))
    }

    /// Names of the rules, in extraction order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Which rule, if any, claims `block`.
    pub fn classify(&self, block: &Block) -> Option<Filter> {
        self.rules.iter().find(|r| r.matches(block.as_str())).map(|r| r.filter)
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }
}

fn special_in_rule(flag: SpecialIn) -> Rule {
    let (name, pattern) = match flag {
        SpecialIn::Title => ("in:title", re!(r"(?i)^in:title$")),
        SpecialIn::Likes => ("in:likes", re!(r"(?i)^in:likes$")),
        SpecialIn::Personal => ("in:personal", re!(r"(?i)^in:personal$")),
        SpecialIn::Seen => ("in:seen", re!(r"(?i)^in:seen$")),
    };
    rule! { name: name, filter: Filter::SpecialIn(flag), pattern: pattern }
}

/// Case-insensitive `prefix(v1|v2|...)suffix`, with the values escaped.
///
/// An empty value list yields a pattern that never matches.
fn one_of(prefix: &str, values: &[&str], suffix: &str) -> Result<Regex, regex::Error> {
    let alternation = if values.is_empty() {
        r"\b\B".to_string()
    } else {
        values.iter().map(|v| regex::escape(v)).collect::<Vec<_>>().join("|")
    };
    RegexBuilder::new(&format!("{prefix}({alternation}){suffix}")).case_insensitive(true).build()
}
