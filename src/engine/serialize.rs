//! Outgoing sync: one edited filter back into the query string.
//!
//! The query is tokenized, the filter's current block is located with the
//! same rule extraction uses, and exactly one block-level edit is applied:
//!
//! ```text
//!             located block   no block
//! value       replace block i push new block
//! no value    remove block i  (nothing)
//! ```
//!
//! Edits address blocks by index, never by substring search, so text that
//! happens to equal the old token elsewhere in the query is left alone. The
//! blocks are then re-joined with single spaces and trimmed.

use super::compiled_rules::CompiledRules;
use super::tokenizer::{join, tokenize};
use crate::{CategoryRef, Filter, StructuredFilters};

/// Rewrite `query` so the block for `filter` reflects `filters`.
///
/// Returns `None` when the session has no rule for `filter` (tags with
/// tagging disabled); the query is then left as it is.
pub(crate) fn serialize(
    rules: &CompiledRules,
    filter: Filter,
    filters: &StructuredFilters,
    query: &str,
) -> Option<String> {
    let rule = rules.get(filter)?;
    let mut blocks: Vec<String> = tokenize(query).into_iter().map(|b| b.text).collect();
    let located = CompiledRules::locate(rule, &blocks);
    let existing = located.map(|i| blocks[i].as_str());
    let rendered = render(rules, filter, filters, existing);

    match (located, rendered) {
        (Some(i), Some(text)) => {
            tracing::debug!(rule = rule.name, from = %blocks[i], to = %text, "replacing block");
            blocks[i] = text;
        }
        (Some(i), None) => {
            tracing::debug!(rule = rule.name, block = %blocks[i], "removing block");
            blocks.remove(i);
        }
        (None, Some(text)) => {
            tracing::debug!(rule = rule.name, block = %text, "appending block");
            blocks.push(text);
        }
        (None, None) => {}
    }

    Some(join(&blocks))
}

/// Canonical token text for `filter`, or `None` when the field is empty.
fn render(rules: &CompiledRules, filter: Filter, filters: &StructuredFilters, existing: Option<&str>) -> Option<String> {
    match filter {
        Filter::Username => filters.username.as_ref().map(|u| format!("@{u}")),
        Filter::Category => filters.category.as_ref().map(|c| render_category(c, existing)),
        Filter::Tags => {
            let tags = filters.tags.as_ref().filter(|t| !t.is_empty())?;
            let separator = if filters.all_tags { "+" } else { "," };
            Some(format!("tags:{}", tags.join(separator)))
        }
        Filter::In => filters.in_filter.as_ref().map(|value| {
            let keyword = if rules.options().uses_with_keyword(value) { "with" } else { "in" };
            format!("{keyword}:{value}")
        }),
        Filter::SpecialIn(flag) => filters.special_in.get(flag).then(|| flag.token()),
        Filter::Status => filters.status.as_ref().map(|s| format!("status:{s}")),
        Filter::MinPostCount => filters.min_post_count.as_ref().map(|n| format!("min_post_count:{n}")),
        Filter::PostTime => {
            let time = &filters.post_time;
            time.days.as_ref().map(|days| format!("{}:{days}", time.when))
        }
    }
}

/// Category token text.
///
/// New blocks use the slug form (`#parent:slug` or `#slug`). A block already
/// written in id form (`category:5`) keeps that form; anything else is
/// rewritten in slug form.
fn render_category(category: &CategoryRef, existing: Option<&str>) -> String {
    if existing.is_some_and(|block| regex!(r"(?i)^category:[0-9]+$").is_match(block)) {
        return format!("category:{}", category.id);
    }
    match &category.parent_slug {
        Some(parent) => format!("#{parent}:{}", category.slug),
        None => format!("#{}", category.slug),
    }
}
