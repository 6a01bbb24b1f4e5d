//! # Domain Model
//!
//! Core data types shared by the store, the search index and the facade:
//! [`MetadataRecord`], [`Revision`], [`DocumentView`] and the history summaries.
//!
//! ## Metadata Sidecar
//!
//! Every page carries a `meta.json` next to its content:
//!
//! ```text
//! {
//!   "creation_time": 1700000000,
//!   "creation_user": "alice",
//!   "modified_time": 1700000500,
//!   "modified_user": "bob",
//!   "tags": "howto linux"
//! }
//! ```
//!
//! All fields are optional on disk. Sidecars written by older versions or by hand may
//! miss any of them, so readers call [`MetadataRecord::fill_defaults`] before use.
//!
//! ## Equivalence
//!
//! Saving a page is a no-op when nothing meaningful changed. Content is compared after
//! normalizing line endings and surrounding blank lines ([`content_equivalent`]); tags
//! are compared as whitespace-separated word lists ([`normalize_tags`]).

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which state of a page an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    Live,
    History(u32),
}

impl Revision {
    pub fn from_version(version: Option<u32>) -> Self {
        match version {
            Some(v) => Revision::History(v),
            None => Revision::Live,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl MetadataRecord {
    /// Fills missing timestamps with `now`.
    pub fn fill_defaults(&mut self, now: i64) {
        if self.creation_time.is_none() {
            self.creation_time = Some(now);
        }
        if self.modified_time.is_none() {
            self.modified_time = Some(now);
        }
    }

    pub fn with_defaults(mut self, now: i64) -> Self {
        self.fill_defaults(now);
        self
    }

    /// Normalized tag string, empty when unset.
    pub fn tags_or_empty(&self) -> String {
        self.tags.as_deref().map(normalize_tags).unwrap_or_default()
    }
}

pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

pub fn normalize_tags(tags: &str) -> String {
    tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_content(content: &str) -> String {
    content.replace("\r\n", "\n").trim_matches('\n').to_string()
}

/// True when two contents differ only in line endings or leading/trailing blank lines.
pub fn content_equivalent(a: &str, b: &str) -> bool {
    canonical_content(a) == canonical_content(b)
}

/// Where a [`DocumentView`] was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A page written through the facade.
    User,
    /// A read-only page from the system pages root.
    SystemDefault,
    /// The built-in welcome text for the configured start page.
    BuiltinStartpage,
    /// Nothing exists for this path.
    Missing,
}

#[derive(Debug, Clone)]
pub struct DocumentView {
    pub path: String,
    pub title: String,
    pub content: String,
    pub metadata: MetadataRecord,
    pub version: Option<u32>,
    pub source: Source,
}

impl DocumentView {
    /// Whether a user page backs this view.
    pub fn is_available(&self) -> bool {
        self.source == Source::User
    }
}

/// One stored history version of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub version: u32,
    pub metadata: MetadataRecord,
}

/// History version annotated with what changed between it and the next newer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub version: u32,
    pub modified_time: Option<i64>,
    pub modified_user: Option<String>,
    pub content_changed: bool,
    pub tags_changed: bool,
}
