//! IBM Watson Language Translator, the metered primary provider.

use super::{LanguagePair, QuotaUnit, Translation, TranslationProvider};
use crate::cache::{Quota, QuotaPeriod};
use crate::config::WatsonSettings;
use crate::error::ProviderError;
use crate::newsroom::Newsroom;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const CHARACTERS_KEY: &str = "watson_characters_remaining";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    model_id: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedItem>,
    character_count: u64,
}

#[derive(Debug, Deserialize)]
struct TranslatedItem {
    translation: String,
}

#[derive(Debug, Clone)]
pub struct Watson {
    settings: WatsonSettings,
    timeout: Duration,
}

impl Watson {
    pub fn new(settings: WatsonSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// Fresh authenticated client for one call.
    fn connect(&self) -> Result<(Client, &str), ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::NotConfigured("watson api_key"))?;
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Init(e.to_string()))?;
        Ok((client, api_key))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v3/translate?version={}",
            self.settings.service_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.version)
        )
    }
}

fn into_translation(response: TranslateResponse) -> Result<Translation, ProviderError> {
    let text = response
        .translations
        .into_iter()
        .next()
        .map(|item| item.translation)
        .filter(|text| !text.is_empty())
        .ok_or(ProviderError::EmptyResponse)?;
    Ok(Translation {
        text,
        consumed: response.character_count,
    })
}

#[async_trait]
impl TranslationProvider for Watson {
    fn name(&self) -> &'static str {
        "watson"
    }

    fn quota(&self) -> Quota {
        Quota {
            key: CHARACTERS_KEY,
            limit: self.settings.monthly_char_limit,
            period: QuotaPeriod::Monthly,
        }
    }

    fn unit(&self) -> QuotaUnit {
        QuotaUnit::Characters
    }

    #[instrument(level = "debug", skip_all, fields(%pair))]
    async fn call(
        &self,
        _room: &mut Newsroom,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<Translation, ProviderError> {
        let (client, api_key) = self.connect()?;
        let body = TranslateRequest {
            text: [text],
            model_id: pair.to_string(),
        };
        let response: TranslateResponse = client
            .post(self.endpoint())
            .basic_auth("apikey", Some(api_key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(characters = response.character_count, "Watson translated text");
        into_translation(response)
    }
}
