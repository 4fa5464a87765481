//! Runtime settings, loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that talks to a local SOCKS proxy on port 9050.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Anonymizing proxy every page fetch goes through.
    pub proxy_url: String,
    pub request_timeout_secs: u64,
    /// Pages with fewer whitespace-delimited words are not stored.
    pub min_words_to_scrape: usize,
    /// Fraction of sentences kept by the summarizer.
    pub summarize_ratio: f64,
    pub keyword_count: usize,
    /// Maximum number of records kept in the log feed.
    pub log_capacity: usize,
    /// Pages fetched before a cycle to log the identity and egress address.
    pub connection_check_urls: Vec<String>,
    pub watson: WatsonSettings,
    pub mymemory: MyMemorySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proxy_url: "socks5h://127.0.0.1:9050".to_string(),
            request_timeout_secs: 60,
            min_words_to_scrape: 200,
            summarize_ratio: 0.2,
            keyword_count: 10,
            log_capacity: 500,
            connection_check_urls: vec![
                "https://httpbin.org/user-agent".to_string(),
                "http://httpbin.org/ip".to_string(),
            ],
            watson: WatsonSettings::default(),
            mymemory: MyMemorySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatsonSettings {
    pub api_key: Option<String>,
    pub service_url: String,
    pub version: String,
    pub monthly_char_limit: u64,
}

impl Default for WatsonSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            service_url: "https://api.eu-gb.language-translator.watson.cloud.ibm.com".to_string(),
            version: "2018-05-01".to_string(),
            monthly_char_limit: 998_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MyMemorySettings {
    pub endpoint: String,
    pub daily_word_limit: u64,
    /// Longer texts are translated sentence by sentence.
    pub max_request_chars: usize,
}

impl Default for MyMemorySettings {
    fn default() -> Self {
        Self {
            endpoint: "http://api.mymemory.translated.net/get".to_string(),
            daily_word_limit: 1000,
            max_request_chars: 500,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let shown_path = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown_path.clone(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: shown_path.clone(),
            source,
        })?;
        info!(path = %shown_path, "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mymemory.max_request_chars, 500);
        assert_eq!(settings.watson.monthly_char_limit, 998_000);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
min_words_to_scrape: 50
watson:
  api_key: secret
mymemory:
  daily_word_limit: 20
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.min_words_to_scrape, 50);
        assert_eq!(settings.watson.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.watson.version, "2018-05-01");
        assert_eq!(settings.mymemory.daily_word_limit, 20);
        assert_eq!(settings.proxy_url, "socks5h://127.0.0.1:9050");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }
}
