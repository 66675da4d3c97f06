//! JSON configuration for hosts that do not build sessions in code (the CLI).
//!
//! ```json
//! {
//!   "settings": { "current_user_present": true, "tagging_enabled": true },
//!   "extensions": { "status_options": ["solved"] },
//!   "categories": [
//!     { "id": 5, "slug": "bugs" },
//!     { "id": 7, "slug": "howto", "parent_slug": "support" }
//!   ]
//! }
//! ```
//!
//! Every section is optional.

use crate::error::ConfigError;
use crate::{CategoryCatalog, CategoryRef, OptionExtensions, SessionSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub settings: SessionSettings,
    /// Values appended to the option registry before the session is built.
    pub extensions: OptionExtensions,
    pub categories: Vec<CategoryRef>,
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn catalog(&self) -> CategoryCatalog {
        self.categories.iter().cloned().collect()
    }
}
