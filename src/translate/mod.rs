//! Translation with quota-gated provider fallback.
//!
//! Providers are tried in order. Each one checks its own quota counter in the
//! cache before spending a request, and charges the counter afterwards with
//! whatever the provider reports as consumed. A provider that is out of quota
//! or fails is logged and skipped; only cache errors abort the whole call.
//!
//! | Provider | Module | Quota | Transport |
//! |----------|--------|-------|-----------|
//! | IBM Watson | [`watson`] | characters per month | direct HTTPS |
//! | MyMemory | [`mymemory`] | words per day | proxied fetcher |

pub mod mymemory;
pub mod watson;

use crate::cache::Quota;
use crate::config::Settings;
use crate::error::{CacheError, ProviderError, TranslateError};
use crate::newsroom::Newsroom;
use crate::text::word_count;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use tracing::debug;

pub use mymemory::MyMemory;
pub use watson::Watson;

/// Source and target language, rendered as `el-en`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// What a provider's quota counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaUnit {
    Characters,
    Words,
}

impl QuotaUnit {
    pub fn measure(self, text: &str) -> u64 {
        match self {
            QuotaUnit::Characters => text.chars().count() as u64,
            QuotaUnit::Words => word_count(text) as u64,
        }
    }
}

/// A successful provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    /// Amount charged against the quota, as reported by the provider.
    pub consumed: u64,
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn quota(&self) -> Quota;
    fn unit(&self) -> QuotaUnit;

    /// One raw call to the provider, without quota bookkeeping.
    async fn call(
        &self,
        room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<Translation, ProviderError>;

    /// Quota check, call, then charge the counter.
    async fn try_translate(
        &self,
        room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<String, TranslateError> {
        let quota = self.quota();
        let requested = self.unit().measure(text);
        let remaining = quota.remaining(&mut *room.store, Utc::now())?;
        if remaining <= requested as i64 {
            return Err(TranslateError::QuotaExceeded {
                provider: self.name(),
                remaining,
                requested,
            });
        }

        let translation = self
            .call(room, text, pair)
            .await
            .map_err(|source| TranslateError::Provider {
                provider: self.name(),
                source,
            })?;
        let left = quota.consume(&mut *room.store, translation.consumed)?;
        debug!(
            provider = self.name(),
            requested,
            consumed = translation.consumed,
            left,
            "Translation charged to quota"
        );
        Ok(translation.text)
    }
}

/// Ordered provider chain.
pub struct Translator {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl Translator {
    pub fn new(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    /// Watson first, MyMemory as the fallback.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(vec![
            Box::new(Watson::new(
                settings.watson.clone(),
                std::time::Duration::from_secs(settings.request_timeout_secs),
            )),
            Box::new(MyMemory::new(settings.mymemory.clone())),
        ])
    }

    /// First successful translation, or `None` when every provider declined.
    pub async fn translate_this(
        &self,
        room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<Option<String>, CacheError> {
        room.log.info("Translating...");
        for provider in &self.providers {
            match provider.try_translate(room, text, pair).await {
                Ok(translated) => return Ok(Some(translated)),
                Err(e @ TranslateError::QuotaExceeded { .. }) => room.log.warning(e.to_string()),
                Err(e @ TranslateError::Provider { .. }) => room.log.error(e.to_string()),
                Err(TranslateError::Cache(e)) => return Err(e),
            }
        }
        room.log
            .warning(format!("No provider could translate {pair} text"));
        Ok(None)
    }
}
