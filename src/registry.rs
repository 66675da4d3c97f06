//! Process-wide, append-only registry of filter option values.
//!
//! The `in:`/`with:`, `status:` and post-time filters accept a fixed list of
//! values. Plugins may append to those lists at startup; the lists are then
//! frozen the first time a session is built from the global registry and stay
//! immutable for the rest of the process.
//!
//! ```text
//! register_search_options(ext) ──▶ pending (Mutex<SearchOptions>)
//!                                        │ first SearchSession::new
//!                                        ▼
//!                                sealed (OnceCell<Arc<SearchOptions>>)
//! ```

use crate::error::RegistryError;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const IN_OPTIONS_FOR_ALL: &[&str] = &["first", "pinned", "wiki", "images"];
const IN_OPTIONS_FOR_USERS: &[&str] = &["unseen", "posted", "created", "watching", "tracking", "bookmarks"];
const STATUS_OPTIONS: &[&str] = &["open", "closed", "public", "archived", "noreplies", "single_user"];
const POST_TIME_OPTIONS: &[&str] = &["before", "after"];
const WITH_KEYWORD_OPTIONS: &[&str] = &["images"];

static GLOBAL: Lazy<OptionRegistry> = Lazy::new(OptionRegistry::new);

/// The option lists a session compiles its rule table from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// `in:` values available to everyone.
    pub in_options_for_all: Vec<String>,
    /// `in:` values only offered when a user is signed in.
    pub in_options_for_users: Vec<String>,
    pub status_options: Vec<String>,
    pub post_time_options: Vec<String>,
    /// `in:` values rendered with the `with:` keyword instead.
    pub with_keyword_options: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        Self {
            in_options_for_all: owned(IN_OPTIONS_FOR_ALL),
            in_options_for_users: owned(IN_OPTIONS_FOR_USERS),
            status_options: owned(STATUS_OPTIONS),
            post_time_options: owned(POST_TIME_OPTIONS),
            with_keyword_options: owned(WITH_KEYWORD_OPTIONS),
        }
    }
}

impl SearchOptions {
    /// `in:` values for a session, signed-in values first.
    pub fn in_values(&self, current_user_present: bool) -> Vec<&str> {
        let users = self.in_options_for_users.iter().filter(|_| current_user_present);
        users.chain(self.in_options_for_all.iter()).map(String::as_str).collect()
    }

    pub fn uses_with_keyword(&self, value: &str) -> bool {
        self.with_keyword_options.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Append `ext` to these lists. Values are lower-cased; duplicates are skipped.
    pub fn extend(&mut self, ext: &OptionExtensions) -> Result<(), RegistryError> {
        // Validate everything first so a bad value leaves the lists untouched.
        let lists: [(&'static str, &Vec<String>); 5] = [
            ("in", &ext.in_options_for_all),
            ("in (signed-in)", &ext.in_options_for_users),
            ("status", &ext.status_options),
            ("post time", &ext.post_time_options),
            ("with keyword", &ext.with_keyword_options),
        ];
        for (list, values) in lists {
            if let Some(bad) = values.iter().find(|v| v.is_empty() || v.chars().any(char::is_whitespace)) {
                return Err(RegistryError::InvalidValue { list, value: bad.clone() });
            }
        }

        append_unique(&mut self.in_options_for_all, &ext.in_options_for_all);
        append_unique(&mut self.in_options_for_users, &ext.in_options_for_users);
        append_unique(&mut self.status_options, &ext.status_options);
        append_unique(&mut self.post_time_options, &ext.post_time_options);
        append_unique(&mut self.with_keyword_options, &ext.with_keyword_options);
        Ok(())
    }
}

fn append_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        let value = value.to_lowercase();
        if target.contains(&value) {
            tracing::debug!(value = %value, "option already registered; skipping");
            continue;
        }
        target.push(value);
    }
}

/// Values a collaborator wants appended to the built-in option lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionExtensions {
    pub in_options_for_all: Vec<String>,
    pub in_options_for_users: Vec<String>,
    pub status_options: Vec<String>,
    pub post_time_options: Vec<String>,
    pub with_keyword_options: Vec<String>,
}

/// Append-only option lists that freeze on first use.
#[derive(Debug)]
pub struct OptionRegistry {
    pending: Mutex<SearchOptions>,
    sealed: OnceCell<Arc<SearchOptions>>,
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self { pending: Mutex::new(SearchOptions::default()), sealed: OnceCell::new() }
    }

    /// Append option values. Fails once the registry has been sealed.
    pub fn register(&self, ext: &OptionExtensions) -> Result<(), RegistryError> {
        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Checked under the lock: `seal` takes the same lock while initializing.
        if self.sealed.get().is_some() {
            return Err(RegistryError::Sealed);
        }
        pending.extend(ext)
    }

    /// Freeze the lists and return the shared snapshot. Idempotent.
    pub fn seal(&self) -> Arc<SearchOptions> {
        self.sealed
            .get_or_init(|| {
                let pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                tracing::debug!(
                    in_all = pending.in_options_for_all.len(),
                    in_users = pending.in_options_for_users.len(),
                    status = pending.status_options.len(),
                    "sealing search options"
                );
                Arc::new(pending.clone())
            })
            .clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get().is_some()
    }
}

/// Append values to the process-wide option lists.
///
/// Must be called before the first [`crate::SearchSession::new`]; afterwards
/// it returns [`RegistryError::Sealed`].
pub fn register_search_options(ext: &OptionExtensions) -> Result<(), RegistryError> {
    GLOBAL.register(ext)
}

/// The frozen process-wide option lists (seals the registry on first call).
pub fn sealed_search_options() -> Arc<SearchOptions> {
    GLOBAL.seal()
}
