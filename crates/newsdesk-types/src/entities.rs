//! Concrete newsroom entities.
//!
//! These are the record types the content-management system persists
//! through the data layer. Each implements [`Record`] and carries the
//! session-managed `id` and `version` fields alongside its own columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{RecordId, VersionToken};
use crate::record::Record;

/// A language content can be authored in.
///
/// The `code` is the ISO 639-1 two-letter code and is unique across the
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Store-assigned identifier; `None` until persisted.
    pub id: Option<RecordId>,
    /// Optimistic-concurrency token; `None` until persisted.
    pub version: Option<VersionToken>,
    /// Display name, e.g. "English".
    pub name: String,
    /// ISO 639-1 code, e.g. "en".
    pub code: String,
}

impl Language {
    /// Create an unsaved language.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: None,
            version: None,
            name: name.into(),
            code: code.into(),
        }
    }
}

impl Record for Language {
    const COLLECTION: &'static str = "Language";

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn version(&self) -> Option<VersionToken> {
        self.version
    }
}

/// A news item moving through the editorial workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Store-assigned identifier; `None` until persisted.
    pub id: Option<RecordId>,
    /// Optimistic-concurrency token; `None` until persisted.
    pub version: Option<VersionToken>,
    /// Headline of the item.
    pub title: String,
    /// URL-safe slug; unique across the collection.
    pub slug: String,
    /// Body word count, maintained by the editor.
    pub word_count: u32,
    /// Publication time; `None` while the item is a draft.
    pub published_at: Option<DateTime<Utc>>,
    /// When the item was first drafted.
    pub created_at: DateTime<Utc>,
}

impl NewsItem {
    /// Create an unsaved draft item.
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: None,
            version: None,
            title: title.into(),
            slug: slug.into(),
            word_count: 0,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set the body word count.
    #[must_use]
    pub const fn with_word_count(mut self, words: u32) -> Self {
        self.word_count = words;
        self
    }

    /// Mark the item as published at the given time.
    #[must_use]
    pub const fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

impl Record for NewsItem {
    const COLLECTION: &'static str = "NewsItem";

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn version(&self) -> Option<VersionToken> {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_language_has_no_identity() {
        let lang = Language::new("English", "en");
        assert!(lang.id().is_none());
        assert!(lang.version().is_none());
        assert_eq!(lang.code, "en");
    }

    #[test]
    fn language_roundtrip_serde() {
        let lang = Language {
            id: Some(RecordId(3)),
            version: Some(VersionToken(2)),
            name: "Danish".to_owned(),
            code: "da".to_owned(),
        };
        let json = serde_json::to_value(&lang).ok();
        let Some(doc) = json else {
            assert!(json.is_some());
            return;
        };
        assert_eq!(doc.get("code").and_then(|v| v.as_str()), Some("da"));
        let restored: Result<Language, _> = serde_json::from_value(doc);
        assert_eq!(restored.ok(), Some(lang));
    }

    #[test]
    fn news_item_builders() {
        let item = NewsItem::new("Budget passes", "budget-passes").with_word_count(450);
        assert_eq!(item.word_count, 450);
        assert!(item.published_at.is_none());
        assert_eq!(NewsItem::COLLECTION, "NewsItem");
    }
}
