use crate::engine::{self, CompiledRules};
use crate::error::ConfigError;
use crate::registry::{self, SearchOptions};
use crate::{Block, CategoryRef, CategoryResolver, Filter, FilterSet, SpecialIn, Status, StructuredFilters, When};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Host-provided switches for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Offer the signed-in `in:` values (`in:bookmarks`, `in:watching`, ...).
    pub current_user_present: bool,
    /// When false, tag blocks are neither extracted nor written.
    pub tagging_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { current_user_present: false, tagging_enabled: true }
    }
}

/// Called with the new query after every outgoing edit.
pub type QueryListener = Box<dyn FnMut(&str)>;

/// Called whenever the category field changes, in either direction.
pub type CategoryListener = Box<dyn FnMut(Option<&CategoryRef>)>;

/// A structured edit coming from the host's form controls.
///
/// Empty strings and empty lists mean "clear". Values are normalized the way
/// extraction would read them back (trimmed, and lower-cased for usernames,
/// `in:` values and post counts).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Username(Option<String>),
    Category(Option<CategoryRef>),
    Tags(Option<Vec<String>>),
    AllTags(bool),
    In(Option<String>),
    SpecialIn(SpecialIn, bool),
    Status(Option<Status>),
    MinPostCount(Option<String>),
    /// Switch between `before:` and `after:`; rewrites the block only if a
    /// date is set.
    PostWhen(When),
    PostDays(Option<String>),
    /// Set the post time date, written as `YYYY-MM-DD`.
    PostDate(NaiveDate),
}

impl FilterEdit {
    /// The filter whose block this edit rewrites.
    pub fn filter(&self) -> Filter {
        match self {
            FilterEdit::Username(_) => Filter::Username,
            FilterEdit::Category(_) => Filter::Category,
            FilterEdit::Tags(_) | FilterEdit::AllTags(_) => Filter::Tags,
            FilterEdit::In(_) => Filter::In,
            FilterEdit::SpecialIn(flag, _) => Filter::SpecialIn(*flag),
            FilterEdit::Status(_) => Filter::Status,
            FilterEdit::MinPostCount(_) => Filter::MinPostCount,
            FilterEdit::PostWhen(_) | FilterEdit::PostDays(_) | FilterEdit::PostDate(_) => Filter::PostTime,
        }
    }
}

/// One synchronization session between a query string and its filters.
///
/// The session owns both representations. Incoming query changes go through
/// [`apply_query`](Self::apply_query); structured edits go through
/// [`edit`](Self::edit), which rewrites the query and emits it to the query
/// listener. Feeding an emitted query back into `apply_query` is a no-op.
///
/// # Example
/// ```
/// use querysync::{CategoryCatalog, CategoryRef, FilterEdit, SearchOptions, SearchSession, SessionSettings, Status};
/// use std::sync::Arc;
///
/// let catalog = CategoryCatalog::new(vec![CategoryRef::new(5, "bugs")]);
/// let options = Arc::new(SearchOptions::default());
/// let mut session = SearchSession::with_options(catalog, SessionSettings::default(), options).unwrap();
///
/// session.apply_query("status:open category:5 widgets");
/// assert_eq!(session.filters().status, Some(Status::Open));
/// assert_eq!(session.filters().category.as_ref().map(|c| c.id), Some(5));
///
/// assert_eq!(session.edit(FilterEdit::Status(None)), "category:5 widgets");
/// ```
pub struct SearchSession<R> {
    resolver: R,
    settings: SessionSettings,
    rules: CompiledRules,
    filters: StructuredFilters,
    query: String,
    on_query_change: Option<QueryListener>,
    on_category_change: Option<CategoryListener>,
}

impl<R: std::fmt::Debug> std::fmt::Debug for SearchSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("resolver", &self.resolver)
            .field("settings", &self.settings)
            .field("filters", &self.filters)
            .field("query", &self.query)
            .field("on_query_change", &self.on_query_change.as_ref().map(|_| "<function>"))
            .field("on_category_change", &self.on_category_change.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl<R: CategoryResolver> SearchSession<R> {
    /// Create a session from the process-wide option registry.
    ///
    /// This seals the registry: later calls to
    /// [`registry::register_search_options`] fail.
    pub fn new(resolver: R, settings: SessionSettings) -> Result<Self, ConfigError> {
        Self::with_options(resolver, settings, registry::sealed_search_options())
    }

    /// Create a session from explicit option lists.
    pub fn with_options(
        resolver: R,
        settings: SessionSettings,
        options: Arc<SearchOptions>,
    ) -> Result<Self, ConfigError> {
        let rules = CompiledRules::new(options, &settings)?;
        Ok(Self {
            resolver,
            settings,
            rules,
            filters: StructuredFilters::default(),
            query: String::new(),
            on_query_change: None,
            on_category_change: None,
        })
    }

    pub fn on_query_change(&mut self, listener: impl FnMut(&str) + 'static) -> &mut Self {
        self.on_query_change = Some(Box::new(listener));
        self
    }

    pub fn on_category_change(&mut self, listener: impl FnMut(Option<&CategoryRef>) + 'static) -> &mut Self {
        self.on_category_change = Some(Box::new(listener));
        self
    }

    pub fn filters(&self) -> &StructuredFilters {
        &self.filters
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn blocks(&self) -> Vec<Block> {
        engine::tokenize(&self.query)
    }

    /// Incoming sync: adopt `query` and rebuild the filters from it.
    ///
    /// Returns the fields that changed; empty when `query` already matched.
    pub fn apply_query(&mut self, query: &str) -> FilterSet {
        self.query = query.to_string();
        let blocks = engine::tokenize(query);
        let changed = engine::extract(&self.rules, &self.resolver, &blocks, &mut self.filters);

        if changed.contains(FilterSet::CATEGORY) {
            self.notify_category();
        }
        changed
    }

    /// Outgoing sync: apply `edit`, rewrite its block, and emit the new query.
    ///
    /// Edits that cannot be written as a single block (an `in:` or `status:`
    /// value the session does not offer, a value with whitespace or quotes, or a
    /// category slug containing `:`) are ignored and leave both the filters and
    /// the query unchanged, as are tag edits when tagging is disabled.
    pub fn edit(&mut self, edit: FilterEdit) -> &str {
        let filter = edit.filter();
        if self.rules.get(filter).is_none() {
            tracing::debug!(?filter, "filter disabled in this session; edit ignored");
            return &self.query;
        }
        let previous_category = self.filters.category.as_ref().map(|c| c.id);
        let direction = match &edit {
            FilterEdit::PostWhen(when) => Some(when.clone()),
            _ => None,
        };

        if !self.apply_edit(edit) {
            return &self.query;
        }

        if self.filters.category.as_ref().map(|c| c.id) != previous_category {
            self.notify_category();
        }

        if let Some(query) = engine::serialize(&self.rules, filter, &self.filters, &self.query) {
            self.query = query;
        }

        // Re-read the canonical query so the model is exactly what the string says.
        let blocks = engine::tokenize(&self.query);
        let settled = engine::extract(&self.rules, &self.resolver, &blocks, &mut self.filters);
        if settled.contains(FilterSet::CATEGORY) {
            self.notify_category();
        }
        // Without a date there is no block yet; hold the direction for the next date edit.
        if let Some(when) = direction.filter(|_| self.filters.post_time.days.is_none()) {
            self.filters.post_time.when = when;
        }

        if let Some(listener) = self.on_query_change.as_mut() {
            listener(&self.query);
        }
        &self.query
    }

    /// Select a category by id (or clear it with `None`), resolving it first.
    ///
    /// An id the resolver does not know clears the category.
    pub fn select_category(&mut self, id: Option<u64>) -> &str {
        let category = id.and_then(|id| self.resolver.resolve_by_id(id));
        self.edit(FilterEdit::Category(category))
    }

    fn notify_category(&mut self) {
        if let Some(listener) = self.on_category_change.as_mut() {
            listener(self.filters.category.as_ref());
        }
    }

    /// Store `edit` in the model. Returns false when it was rejected.
    fn apply_edit(&mut self, edit: FilterEdit) -> bool {
        let filters = &mut self.filters;

        match edit {
            FilterEdit::Username(value) => match clean(value, true) {
                Ok(value) => filters.username = value,
                Err(bad) => return reject("username", &bad),
            },
            FilterEdit::Category(category) => {
                // `:` separates parent from slug in the rendered token.
                let slugs = category.iter().flat_map(|c| std::iter::once(&c.slug).chain(c.parent_slug.as_ref()));
                if let Some(bad) = slugs.map(String::as_str).find(|s| !is_block_safe(s) || s.contains(':')) {
                    return reject("category", bad);
                }
                filters.category = category;
            }
            FilterEdit::Tags(tags) => {
                let tags: Vec<String> =
                    tags.unwrap_or_default().into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
                if let Some(bad) = tags.iter().find(|t| !is_block_safe(t) || t.contains([',', '+'])) {
                    return reject("tag", bad);
                }
                filters.tags = if tags.is_empty() { None } else { Some(tags) };
            }
            FilterEdit::AllTags(all) => filters.all_tags = all,
            FilterEdit::In(value) => match clean(value, true) {
                Ok(Some(value)) if !self.rules.accepts(Filter::In, &format!("in:{value}")) => {
                    return reject("in", &value);
                }
                Ok(value) => filters.in_filter = value,
                Err(bad) => return reject("in", &bad),
            },
            FilterEdit::SpecialIn(flag, enabled) => filters.special_in.set(flag, enabled),
            FilterEdit::Status(status) => {
                if let Some(status) = &status {
                    if !self.rules.accepts(Filter::Status, &format!("status:{status}")) {
                        return reject("status", status.as_str());
                    }
                }
                filters.status = status;
            }
            FilterEdit::MinPostCount(value) => match clean(value, true) {
                Ok(value) => filters.min_post_count = value,
                Err(bad) => return reject("min_post_count", &bad),
            },
            FilterEdit::PostWhen(when) => {
                if !self.rules.accepts(Filter::PostTime, &format!("{when}:")) {
                    return reject("post time keyword", when.as_str());
                }
                filters.post_time.when = when;
            }
            FilterEdit::PostDays(days) => match clean(days, false) {
                Ok(days) => filters.post_time.days = days,
                Err(bad) => return reject("post time", &bad),
            },
            FilterEdit::PostDate(date) => {
                filters.post_time.days = Some(date.format(crate::PostTime::DATE_FORMAT).to_string());
            }
        }
        true
    }
}

/// Trim (and optionally lower-case) a scalar edit; `Err` carries a value that
/// would not fit in one block.
fn clean(value: Option<String>, lowercase: bool) -> Result<Option<String>, String> {
    let Some(value) = value else { return Ok(None) };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if !is_block_safe(value) {
        return Err(value.to_string());
    }
    Ok(Some(if lowercase { value.to_lowercase() } else { value.to_string() }))
}

fn is_block_safe(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '"')
}

fn reject(field: &str, value: &str) -> bool {
    tracing::warn!(field, value, "ignoring edit that cannot be written as a single query block");
    false
}
