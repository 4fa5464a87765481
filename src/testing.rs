//! Scripted transports and providers shared by unit tests.

use crate::cache::{Quota, QuotaPeriod};
use crate::config::Settings;
use crate::error::{FetchError, ProviderError};
use crate::fetcher::{HttpClient, Page};
use crate::newsroom::Newsroom;
use crate::store::JsonStore;
use crate::translate::{LanguagePair, QuotaUnit, Translation, TranslationProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Page(u16, String),
    Failure,
}

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<String, Reply>,
    requests: Vec<(String, String)>,
}

/// Transport answering from a fixed table; unknown URLs get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttp {
    state: Arc<Mutex<MockState>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.status(url, 200, body)
    }

    pub fn status(self, url: &str, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(url.to_string(), Reply::Page(status, body.to_string()));
        self
    }

    pub fn failure(self, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(url.to_string(), Reply::Failure);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(_, agent)| agent.clone())
            .collect()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state
                .requests
                .push((url.to_string(), user_agent.to_string()));
            state.replies.get(url).cloned()
        };
        match reply {
            Some(Reply::Page(status, body)) => Ok(Page {
                url: url.to_string(),
                status,
                body,
            }),
            Some(Reply::Failure) => Err(FetchError::Transport(format!("connection refused: {url}"))),
            None => Ok(Page {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

pub fn newsroom(http: MockHttp) -> Newsroom {
    newsroom_with(http, Settings::default())
}

pub fn newsroom_with(http: MockHttp, settings: Settings) -> Newsroom {
    Newsroom::new(Box::new(JsonStore::in_memory()), Box::new(http), settings)
}

/// Provider that returns `prefix + text` (or fails when built without a
/// prefix) and records every call.
#[derive(Debug, Clone)]
pub struct RecordingProvider {
    pub name: &'static str,
    pub quota: Quota,
    pub unit: QuotaUnit,
    pub prefix: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingProvider {
    pub fn new(name: &'static str, prefix: Option<&str>) -> Self {
        Self {
            name,
            quota: Quota {
                key: name,
                limit: 1_000_000,
                period: QuotaPeriod::Daily,
            },
            unit: QuotaUnit::Characters,
            prefix: prefix.map(str::to_string),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn quota(&self) -> Quota {
        self.quota
    }

    fn unit(&self) -> QuotaUnit {
        self.unit
    }

    async fn call(
        &self,
        _room: &mut Newsroom,
        text: &str,
        _pair: &LanguagePair,
    ) -> Result<Translation, ProviderError> {
        self.calls.lock().unwrap().push(text.to_string());
        match &self.prefix {
            Some(prefix) => Ok(Translation {
                text: format!("{prefix}{text}"),
                consumed: text.chars().count() as u64,
            }),
            None => Err(ProviderError::EmptyResponse),
        }
    }
}
