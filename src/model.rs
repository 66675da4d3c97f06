//! Structured filter model.
//!
//! `StructuredFilters` is the in-memory aggregate that mirrors the filter
//! tokens of one search query string. It has no persistence of its own: a
//! session rebuilds it from the string on every incoming change and rebuilds
//! the string from it on every outgoing edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External category identity, as returned by a [`crate::CategoryResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: u64,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_slug: Option<String>,
}

impl CategoryRef {
    pub fn new(id: u64, slug: impl Into<String>) -> Self {
        Self { id, slug: slug.into(), parent_slug: None }
    }

    pub fn with_parent(id: u64, slug: impl Into<String>, parent_slug: impl Into<String>) -> Self {
        Self { id, slug: slug.into(), parent_slug: Some(parent_slug.into()) }
    }
}

// --- Enums with registry-extensible values -----------------------------------

/// Topic status filter (`status:<value>`).
///
/// The six built-in values have their own variants; values appended through
/// the option registry arrive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Status {
    Open,
    Closed,
    Public,
    Archived,
    NoReplies,
    SingleUser,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Open => "open",
            Status::Closed => "closed",
            Status::Public => "public",
            Status::Archived => "archived",
            Status::NoReplies => "noreplies",
            Status::SingleUser => "single_user",
            Status::Other(value) => value,
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "open" => Status::Open,
            "closed" => Status::Closed,
            "public" => Status::Public,
            "archived" => Status::Archived,
            "noreplies" => Status::NoReplies,
            "single_user" => Status::SingleUser,
            other => Status::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Status::from(value.as_str())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Status {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Status::from(s))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the post time filter (`before:<date>` / `after:<date>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum When {
    #[default]
    Before,
    After,
    Other(String),
}

impl When {
    pub fn as_str(&self) -> &str {
        match self {
            When::Before => "before",
            When::After => "after",
            When::Other(value) => value,
        }
    }
}

impl From<&str> for When {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "before" => When::Before,
            "after" => When::After,
            other => When::Other(other.to_string()),
        }
    }
}

impl From<String> for When {
    fn from(value: String) -> Self {
        When::from(value.as_str())
    }
}

impl From<When> for String {
    fn from(value: When) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for When {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(When::from(s))
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Special `in:` flags -----------------------------------------------------

/// One of the exact `in:<flag>` tokens that toggle independently of the
/// generic `in:`/`with:` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialIn {
    Title,
    Likes,
    Personal,
    Seen,
}

impl SpecialIn {
    pub const ALL: [SpecialIn; 4] = [SpecialIn::Title, SpecialIn::Likes, SpecialIn::Personal, SpecialIn::Seen];

    pub fn as_str(self) -> &'static str {
        match self {
            SpecialIn::Title => "title",
            SpecialIn::Likes => "likes",
            SpecialIn::Personal => "personal",
            SpecialIn::Seen => "seen",
        }
    }

    /// Canonical token text, e.g. `in:title`.
    pub fn token(self) -> String {
        format!("in:{}", self.as_str())
    }
}

impl FromStr for SpecialIn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecialIn::ALL
            .into_iter()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown in: flag '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialInFlags {
    pub title: bool,
    pub likes: bool,
    pub personal: bool,
    pub seen: bool,
}

impl SpecialInFlags {
    pub fn get(&self, flag: SpecialIn) -> bool {
        match flag {
            SpecialIn::Title => self.title,
            SpecialIn::Likes => self.likes,
            SpecialIn::Personal => self.personal,
            SpecialIn::Seen => self.seen,
        }
    }

    pub fn set(&mut self, flag: SpecialIn, value: bool) {
        let slot = match flag {
            SpecialIn::Title => &mut self.title,
            SpecialIn::Likes => &mut self.likes,
            SpecialIn::Personal => &mut self.personal,
            SpecialIn::Seen => &mut self.seen,
        };
        *slot = value;
    }
}

// --- Post time ---------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTime {
    pub when: When,
    pub days: Option<String>,
}

impl PostTime {
    /// Date format written by [`crate::FilterEdit::PostDate`].
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";

    /// Interpret `days` as a calendar date, if it is one.
    ///
    /// The payload is stored verbatim, so this returns `None` for relative or
    /// malformed values rather than failing.
    pub fn date(&self) -> Option<NaiveDate> {
        let days = self.days.as_deref()?;
        NaiveDate::parse_from_str(days, Self::DATE_FORMAT).ok()
    }
}

// --- Aggregate ---------------------------------------------------------------

/// Every filter value currently expressed by the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFilters {
    pub username: Option<String>,
    pub category: Option<CategoryRef>,
    pub tags: Option<Vec<String>>,
    /// Tag join mode: `true` means all tags must match (`+`), `false` any (`,`).
    pub all_tags: bool,
    pub in_filter: Option<String>,
    pub special_in: SpecialInFlags,
    pub status: Option<Status>,
    pub min_post_count: Option<String>,
    pub post_time: PostTime,
}
