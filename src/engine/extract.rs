//! Incoming sync: query blocks to structured filters.
//!
//! One pass walks the whole rule table. For each rule:
//!
//! ```text
//! blocks ──first match──▶ block ──strip──▶ payload ──normalize──▶ value
//!    │                                                              │
//!    └─ no match ──▶ clear field                   differs? ──▶ overwrite
//! ```
//!
//! Fields are only written when the computed value differs from the stored
//! one, and every write is recorded in the returned [`FilterSet`]. A second
//! pass over the same blocks therefore returns an empty set.
//!
//! Only the first block claimed by a rule is read; later duplicates are left
//! alone.

use super::compiled_rules::CompiledRules;
use crate::resolve::{CategoryResolver, resolve_category_payload};
use crate::{Block, Filter, FilterSet, Rule, Status, StructuredFilters, When};

/// Run every rule over `blocks` and update `filters` in place.
pub(crate) fn extract<R: CategoryResolver + ?Sized>(
    rules: &CompiledRules,
    resolver: &R,
    blocks: &[Block],
    filters: &mut StructuredFilters,
) -> FilterSet {
    let mut changed = FilterSet::empty();

    for rule in rules.iter() {
        let hit = CompiledRules::locate(rule, blocks).map(|i| blocks[i].as_str());
        apply_rule(rule, hit, resolver, filters, &mut changed);
    }

    if !changed.is_empty() {
        tracing::debug!(changed = ?changed, "filters updated from query");
    }
    changed
}

fn apply_rule<R: CategoryResolver + ?Sized>(
    rule: &Rule,
    hit: Option<&str>,
    resolver: &R,
    filters: &mut StructuredFilters,
    changed: &mut FilterSet,
) {
    let flag = rule.filter.flag();

    match rule.filter {
        Filter::Username => {
            let value = hit.and_then(|block| non_empty(rule.payload(block).to_lowercase()));
            assign(&mut filters.username, value, flag, changed);
        }
        Filter::Category => match hit {
            Some(block) => {
                let Some(found) = resolve_category_payload(resolver, &rule.payload(block)) else {
                    tracing::debug!(block, "category token did not resolve; keeping current category");
                    return;
                };
                if filters.category.as_ref().map(|c| c.id) != Some(found.id) {
                    filters.category = Some(found);
                    changed.insert(flag);
                }
            }
            None => assign(&mut filters.category, None, flag, changed),
        },
        Filter::Tags => {
            let Some(block) = hit else {
                // `all_tags` is a join preference with no token of its own.
                assign(&mut filters.tags, None, flag, changed);
                return;
            };
            let payload = rule.payload(block);
            let all_tags = payload.contains('+');
            let separator = if all_tags { '+' } else { ',' };
            let tags: Vec<String> =
                payload.split(separator).filter(|t| !t.is_empty()).map(|t| t.to_string()).collect();

            assign(&mut filters.all_tags, all_tags, FilterSet::ALL_TAGS, changed);
            assign(&mut filters.tags, if tags.is_empty() { None } else { Some(tags) }, flag, changed);
        }
        Filter::In => {
            let value = hit.and_then(|block| non_empty(rule.payload(block).to_lowercase()));
            assign(&mut filters.in_filter, value, flag, changed);
        }
        Filter::SpecialIn(special) => {
            let present = hit.is_some();
            if filters.special_in.get(special) != present {
                filters.special_in.set(special, present);
                changed.insert(flag);
            }
        }
        Filter::Status => {
            let value = hit.and_then(|block| non_empty(rule.payload(block).to_lowercase())).map(Status::from);
            assign(&mut filters.status, value, flag, changed);
        }
        Filter::MinPostCount => {
            let value = hit.and_then(|block| non_empty(rule.payload(block).to_lowercase()));
            assign(&mut filters.min_post_count, value, flag, changed);
        }
        Filter::PostTime => {
            let Some(block) = hit else {
                assign(&mut filters.post_time.when, When::Before, flag, changed);
                assign(&mut filters.post_time.days, None, flag, changed);
                return;
            };
            let keyword = rule.pattern.regex().captures(block).and_then(|caps| caps.get(1)).map(|m| m.as_str());
            if let Some(keyword) = keyword {
                assign(&mut filters.post_time.when, When::from(keyword), flag, changed);
            }
            assign(&mut filters.post_time.days, non_empty(rule.payload(block).into_owned()), flag, changed);
        }
    }
}

/// Overwrite `slot` only when `value` differs, recording `flag`.
fn assign<T: PartialEq>(slot: &mut T, value: T, flag: FilterSet, changed: &mut FilterSet) {
    if *slot != value {
        *slot = value;
        changed.insert(flag);
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
