//! Data models for topics, sources and articles.
//!
//! This module defines the records the pipeline reads and writes:
//! - [`Topic`] and [`Source`]: operator-managed crawl configuration
//! - [`ArticleDraft`]: a parsed page that passed extraction, not yet stored
//! - [`NewArticle`] / [`Article`]: the persisted article row and its insert form
//! - [`Candidate`]: a discovered `(url, language)` pair
//!
//! Original fields of an article (`original_*`) are written once at
//! creation. Only the editor touches the derived fields, and the status
//! only ever moves from [`ArticleStatus::New`] to [`ArticleStatus::Ready`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language tag of English; articles in any other language get translated.
pub const ENGLISH: &str = "en";

/// Language tags a source may declare.
pub const LANGUAGES: [&str; 3] = ["el", "en", "ru"];

/// A named group of sources crawled together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    pub active: bool,
}

/// A sitemap or listing page that belongs to exactly one [`Topic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: u64,
    pub topic_id: u64,
    /// Page to crawl. A `.xml` suffix marks it as a sitemap.
    pub root_url: String,
    /// Literal prefix every accepted link must start with.
    pub url_filter: String,
    pub language: String,
    pub active: bool,
}

/// Insert form of a [`Source`].
#[derive(Debug, Clone)]
pub struct NewSource {
    pub topic_id: u64,
    pub root_url: String,
    pub url_filter: String,
    pub language: String,
}

/// A candidate article URL produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    pub url: String,
    pub language: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: language.into(),
        }
    }
}

/// A page that parsed as an article and met the word threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl ArticleDraft {
    /// Number of whitespace-delimited tokens in the body text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Editing state of an [`Article`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArticleStatus {
    #[default]
    #[serde(rename = "NW")]
    New,
    #[serde(rename = "RD")]
    Ready,
}

/// Insert form of an [`Article`].
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub topic_id: u64,
    pub source: String,
    pub original_title: String,
    pub original_text: String,
    pub original_language: String,
}

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub topic_id: u64,
    /// Origin URL; unique across the store.
    pub source: String,
    pub original_language: String,
    /// Unique across the store.
    pub original_title: String,
    pub original_text: String,

    pub title: Option<String>,
    /// Summary sentences wrapped in `<p>` elements.
    pub summary: Option<String>,
    /// Comma-joined keywords.
    pub keywords: Option<String>,
    pub status: ArticleStatus,

    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl Article {
    pub fn from_new(id: u64, new: NewArticle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            topic_id: new.topic_id,
            source: new.source,
            original_language: new.original_language,
            original_title: new.original_title,
            original_text: new.original_text,
            title: None,
            summary: None,
            keywords: None,
            status: ArticleStatus::New,
            date_created: now,
            date_modified: now,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ArticleStatus::Ready
    }

    pub fn needs_translation(&self) -> bool {
        self.original_language != ENGLISH
    }

    /// Store the editor's output and move the article to `Ready`.
    pub fn publish(&mut self, title: Option<String>, summary: String, keywords: String) {
        self.title = title;
        self.summary = Some(summary);
        self.keywords = Some(keywords);
        self.status = ArticleStatus::Ready;
        self.date_modified = Utc::now();
    }
}
