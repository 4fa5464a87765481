//! Persistence collaborator: repositories for topics, articles and cache entries.
//!
//! The pipeline only sees the repository traits. [`JsonStore`] is the bundled
//! implementation: all tables live in memory and are rewritten to a single
//! JSON file after every successful write, which is plenty for one crawl
//! cycle at a time.

use crate::cache::CacheEntry;
use crate::error::StoreError;
use crate::models::{Article, NewArticle, NewSource, Source, Topic};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub trait CacheRepository {
    fn cache_entry(&self, key: &str) -> Option<CacheEntry>;
    /// Insert or replace the entry stored under `entry.key`.
    fn put_cache_entry(&mut self, entry: CacheEntry) -> Result<(), StoreError>;
}

pub trait TopicRepository {
    fn topics(&self) -> Vec<Topic>;
    fn active_topics(&self) -> Vec<Topic>;
    /// Active sources of one topic, ordered by id.
    fn active_sources(&self, topic_id: u64) -> Vec<Source>;
    fn create_topic(&mut self, title: &str) -> Result<Topic, StoreError>;
    fn create_source(&mut self, new: NewSource) -> Result<Source, StoreError>;
    fn set_topic_active(&mut self, id: u64, active: bool) -> Result<Topic, StoreError>;
    fn set_source_active(&mut self, id: u64, active: bool) -> Result<Source, StoreError>;
    /// Deletes the topic and its sources; refused while articles reference it.
    fn delete_topic(&mut self, id: u64) -> Result<(), StoreError>;
}

pub trait ArticleRepository {
    fn article(&self, id: u64) -> Option<Article>;
    fn article_by_source(&self, url: &str) -> Option<Article>;
    fn articles(&self) -> Vec<Article>;
    /// Fails with [`StoreError::Integrity`] when `source` or `original_title` is taken.
    fn create_article(&mut self, new: NewArticle) -> Result<Article, StoreError>;
    fn save_article(&mut self, article: &Article) -> Result<(), StoreError>;
}

/// Everything the pipeline needs from persistence.
pub trait Store: CacheRepository + TopicRepository + ArticleRepository + Send {}

impl<T> Store for T where T: CacheRepository + TopicRepository + ArticleRepository + Send {}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    topics: BTreeMap<u64, Topic>,
    sources: BTreeMap<u64, Source>,
    articles: BTreeMap<u64, Article>,
    cache: BTreeMap<String, CacheEntry>,
}

fn next_id<V>(table: &BTreeMap<u64, V>) -> u64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

#[derive(Debug, Default)]
pub struct JsonStore {
    tables: Tables,
    path: Option<PathBuf>,
}

impl JsonStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Tables::default()
        };
        info!(
            path = %path.display(),
            topics = tables.topics.len(),
            articles = tables.articles.len(),
            "Opened store"
        );
        Ok(Self {
            tables,
            path: Some(path),
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.tables)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "Flushed store");
        Ok(())
    }
}

impl CacheRepository for JsonStore {
    fn cache_entry(&self, key: &str) -> Option<CacheEntry> {
        self.tables.cache.get(key).cloned()
    }

    fn put_cache_entry(&mut self, entry: CacheEntry) -> Result<(), StoreError> {
        self.tables.cache.insert(entry.key.clone(), entry);
        self.flush()
    }
}

impl TopicRepository for JsonStore {
    fn topics(&self) -> Vec<Topic> {
        self.tables.topics.values().cloned().collect()
    }

    fn active_topics(&self) -> Vec<Topic> {
        self.tables
            .topics
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect()
    }

    fn active_sources(&self, topic_id: u64) -> Vec<Source> {
        self.tables
            .sources
            .values()
            .filter(|s| s.topic_id == topic_id && s.active)
            .cloned()
            .collect()
    }

    fn create_topic(&mut self, title: &str) -> Result<Topic, StoreError> {
        if self.tables.topics.values().any(|t| t.title == title) {
            return Err(StoreError::Integrity(format!("topic `{title}` already exists")));
        }
        let topic = Topic {
            id: next_id(&self.tables.topics),
            title: title.to_string(),
            active: true,
        };
        self.tables.topics.insert(topic.id, topic.clone());
        self.flush()?;
        Ok(topic)
    }

    fn create_source(&mut self, new: NewSource) -> Result<Source, StoreError> {
        if !self.tables.topics.contains_key(&new.topic_id) {
            return Err(StoreError::NotFound {
                kind: "topic",
                id: new.topic_id,
            });
        }
        let source = Source {
            id: next_id(&self.tables.sources),
            topic_id: new.topic_id,
            root_url: new.root_url,
            url_filter: new.url_filter,
            language: new.language,
            active: true,
        };
        self.tables.sources.insert(source.id, source.clone());
        self.flush()?;
        Ok(source)
    }

    fn set_topic_active(&mut self, id: u64, active: bool) -> Result<Topic, StoreError> {
        let topic = self
            .tables
            .topics
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "topic", id })?;
        topic.active = active;
        let topic = topic.clone();
        self.flush()?;
        Ok(topic)
    }

    fn set_source_active(&mut self, id: u64, active: bool) -> Result<Source, StoreError> {
        let source = self
            .tables
            .sources
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "source", id })?;
        source.active = active;
        let source = source.clone();
        self.flush()?;
        Ok(source)
    }

    fn delete_topic(&mut self, id: u64) -> Result<(), StoreError> {
        let Some(topic) = self.tables.topics.get(&id) else {
            return Err(StoreError::NotFound { kind: "topic", id });
        };
        if self.tables.articles.values().any(|a| a.topic_id == id) {
            return Err(StoreError::Protected(format!("topic `{}`", topic.title)));
        }
        self.tables.topics.remove(&id);
        self.tables.sources.retain(|_, s| s.topic_id != id);
        self.flush()
    }
}

impl ArticleRepository for JsonStore {
    fn article(&self, id: u64) -> Option<Article> {
        self.tables.articles.get(&id).cloned()
    }

    fn article_by_source(&self, url: &str) -> Option<Article> {
        self.tables
            .articles
            .values()
            .find(|a| a.source == url)
            .cloned()
    }

    fn articles(&self) -> Vec<Article> {
        self.tables.articles.values().cloned().collect()
    }

    fn create_article(&mut self, new: NewArticle) -> Result<Article, StoreError> {
        if !self.tables.topics.contains_key(&new.topic_id) {
            return Err(StoreError::NotFound {
                kind: "topic",
                id: new.topic_id,
            });
        }
        for existing in self.tables.articles.values() {
            if existing.source == new.source {
                return Err(StoreError::Integrity(format!(
                    "article source `{}` already exists",
                    new.source
                )));
            }
            if existing.original_title == new.original_title {
                return Err(StoreError::Integrity(format!(
                    "article title `{}` already exists",
                    new.original_title
                )));
            }
        }
        let article = Article::from_new(next_id(&self.tables.articles), new, Utc::now());
        self.tables.articles.insert(article.id, article.clone());
        self.flush()?;
        Ok(article)
    }

    fn save_article(&mut self, article: &Article) -> Result<(), StoreError> {
        let Some(slot) = self.tables.articles.get_mut(&article.id) else {
            return Err(StoreError::NotFound {
                kind: "article",
                id: article.id,
            });
        };
        *slot = article.clone();
        self.flush()
    }
}
