//! Error types for every stage of the newsroom pipeline.
//!
//! Most of these never escape a crawl cycle: fetch, parse, quota and
//! integrity failures are logged to the feed and the offending URL or
//! article is skipped. The exception is [`CacheError::InvalidExpiration`],
//! which signals a bug in quota-reset logic and is propagated with `?`.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure to retrieve a page through the proxied transport.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported URL scheme `{scheme}` in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not configure proxy {proxy}: {reason}")]
    Proxy { proxy: String, reason: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// The fetched document could not be turned into an article.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document has neither a title nor any text")]
    Empty,

    #[error("document could not be read: {0}")]
    Unreadable(String),
}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("integrity conflict: {0}")]
    Integrity(String),

    #[error("{kind} {id} does not exist")]
    NotFound { kind: &'static str, id: u64 },

    #[error("cannot delete {0}: it is still referenced")]
    Protected(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure while reading or updating a cache entry.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("expiration {expire_on} for `{key}` is not after {now}")]
    InvalidExpiration {
        key: String,
        expire_on: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("cache entry `{key}` does not hold a counter: {value:?}")]
    NotACounter { key: String, value: Option<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure inside a single translation provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("provider client could not be initialized: {0}")]
    Init(String),

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the request with status {0}")]
    Rejected(String),

    #[error("provider returned no translation")]
    EmptyResponse,

    #[error("provider could not be reached")]
    NoResponse,
}

/// Outcome of `try_translate` when no translation was produced.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{provider} quota exhausted: {remaining} remaining, {requested} requested")]
    QuotaExceeded {
        provider: &'static str,
        remaining: i64,
        requested: u64,
    },

    #[error("{provider} failed: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Failure to load the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
