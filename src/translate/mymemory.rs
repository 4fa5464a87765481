//! MyMemory, the free fallback provider.
//!
//! Requests go through the proxied fetcher like any other page. The service
//! caps the size of a single request, so long texts are sent one sentence at
//! a time and reassembled with line breaks.

use super::{LanguagePair, QuotaUnit, Translation, TranslationProvider};
use crate::cache::{Quota, QuotaPeriod};
use crate::config::MyMemorySettings;
use crate::error::ProviderError;
use crate::fetcher;
use crate::newsroom::Newsroom;
use crate::text::{split_sentences, word_count};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const WORDS_KEY: &str = "mymemory_words_remaining";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "responseData")]
    data: Option<LookupData>,
    #[serde(rename = "responseStatus")]
    status: Value,
}

#[derive(Debug, Deserialize)]
struct LookupData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

fn is_ok_status(status: &Value) -> bool {
    match status {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct MyMemory {
    settings: MyMemorySettings,
}

impl MyMemory {
    pub fn new(settings: MyMemorySettings) -> Self {
        Self { settings }
    }

    fn lookup_url(&self, text: &str, pair: &LanguagePair) -> String {
        let langpair = format!("{}|{}", pair.source, pair.target);
        format!(
            "{}?q={}&langpair={}",
            self.settings.endpoint,
            urlencoding::encode(text),
            urlencoding::encode(&langpair)
        )
    }

    async fn lookup(
        &self,
        room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<String, ProviderError> {
        let url = self.lookup_url(text, pair);
        let page = fetcher::fetch(room, &url)
            .await
            .ok_or(ProviderError::NoResponse)?;
        let response: LookupResponse = serde_json::from_str(&page.body)
            .map_err(|e| ProviderError::Rejected(format!("unreadable response: {e}")))?;
        if !is_ok_status(&response.status) {
            room.log
                .warning(format!("MyMemory responded with {}", response.status));
            return Err(ProviderError::Rejected(response.status.to_string()));
        }
        response
            .data
            .and_then(|data| data.translated_text)
            .filter(|text| !text.is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[async_trait]
impl TranslationProvider for MyMemory {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    fn quota(&self) -> Quota {
        Quota {
            key: WORDS_KEY,
            limit: self.settings.daily_word_limit,
            period: QuotaPeriod::Daily,
        }
    }

    fn unit(&self) -> QuotaUnit {
        QuotaUnit::Words
    }

    async fn call(
        &self,
        room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<Translation, ProviderError> {
        let translated = if text.chars().count() > self.settings.max_request_chars {
            let mut joined = String::new();
            for sentence in split_sentences(text) {
                let piece = self.lookup(room, &sentence, pair).await?;
                joined.push_str(&piece);
                joined.push_str("\r\n");
            }
            joined
        } else {
            self.lookup(room, text, pair).await?
        };
        Ok(Translation {
            text: translated,
            consumed: word_count(text) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache;
    use crate::log_feed::LogLevel;
    use crate::testing::{MockHttp, newsroom};

    fn provider() -> MyMemory {
        MyMemory::new(MyMemorySettings::default())
    }

    fn greek() -> LanguagePair {
        LanguagePair::new("el", "en")
    }

    fn ok_body(text: &str) -> String {
        serde_json::json!({
            "responseData": {"translatedText": text, "match": 1},
            "responseStatus": 200
        })
        .to_string()
    }

    #[test]
    fn test_lookup_url_encodes_query_and_pair() {
        let url = provider().lookup_url("γεια σου", &greek());
        assert!(url.starts_with("http://api.mymemory.translated.net/get?q="));
        assert!(url.ends_with("&langpair=el%7Cen"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_status_accepts_number_or_string() {
        assert!(is_ok_status(&serde_json::json!(200)));
        assert!(is_ok_status(&serde_json::json!("200")));
        assert!(!is_ok_status(&serde_json::json!(403)));
    }

    #[tokio::test]
    async fn test_short_text_is_one_request_and_charges_words() {
        let p = provider();
        let text = "Καλημέρα κόσμε";
        let http = MockHttp::new().page(&p.lookup_url(text, &greek()), &ok_body("Good morning world"));
        let mut room = newsroom(http.clone());

        let out = p.try_translate(&mut room, text, &greek()).await.unwrap();
        assert_eq!(out, "Good morning world");
        assert_eq!(http.requests().len(), 1);
        let left = cache::get_item(&*room.store, WORDS_KEY).unwrap().counter().unwrap();
        assert_eq!(left, 1000 - 2);
    }

    #[tokio::test]
    async fn test_long_text_is_translated_per_sentence() {
        let p = provider();
        let first = format!("{}.", "α".repeat(300));
        let second = format!("{}.", "β".repeat(300));
        let text = format!("{first} {second}");
        let http = MockHttp::new()
            .page(&p.lookup_url(&first, &greek()), &ok_body("One."))
            .page(&p.lookup_url(&second, &greek()), &ok_body("Two."));
        let mut room = newsroom(http.clone());

        let out = p.try_translate(&mut room, &text, &greek()).await.unwrap();
        assert_eq!(out, "One.\r\nTwo.\r\n");
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_request_size_limit_boundary() {
        let p = provider();
        let at_limit = format!("{}.", "α".repeat(499));
        assert_eq!(at_limit.chars().count(), 500);
        let first = format!("{}.", "α".repeat(249));
        let second = format!("{}.", "β".repeat(249));
        let over_limit = format!("{first} {second}");
        assert_eq!(over_limit.chars().count(), 501);

        let http = MockHttp::new()
            .page(&p.lookup_url(&at_limit, &greek()), &ok_body("Whole."))
            .page(&p.lookup_url(&first, &greek()), &ok_body("One."))
            .page(&p.lookup_url(&second, &greek()), &ok_body("Two."));
        let mut room = newsroom(http.clone());

        let whole = p.call(&mut room, &at_limit, &greek()).await.unwrap();
        assert_eq!(whole.text, "Whole.");
        assert_eq!(http.requests().len(), 1);

        let split = p.call(&mut room, &over_limit, &greek()).await.unwrap();
        assert_eq!(split.text, "One.\r\nTwo.\r\n");
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_sentence_aborts_whole_text() {
        let p = provider();
        let first = format!("{}.", "α".repeat(300));
        let second = format!("{}.", "β".repeat(300));
        let text = format!("{first} {second}");
        let http = MockHttp::new().page(&p.lookup_url(&first, &greek()), &ok_body("One."));
        let mut room = newsroom(http);

        assert!(p.try_translate(&mut room, &text, &greek()).await.is_err());
        let left = cache::get_item(&*room.store, WORDS_KEY).unwrap().counter().unwrap();
        assert_eq!(left, 1000);
    }

    #[tokio::test]
    async fn test_rejected_status_is_logged() {
        let p = provider();
        let body = serde_json::json!({
            "responseData": {"translatedText": "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS"},
            "responseStatus": "403"
        })
        .to_string();
        let http = MockHttp::new().page(&p.lookup_url("γεια", &greek()), &body);
        let mut room = newsroom(http);

        let err = p.call(&mut room, "γεια", &greek()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
        assert!(room.log.contains(LogLevel::Warning, "MyMemory responded with \"403\""));
    }
}
