//! Anonymized page fetching.
//!
//! Every request goes through the configured proxy (Tor's SOCKS port by
//! default) and carries the current rotated identity as its `User-Agent`.
//! [`fetch`] never fails loudly: transport problems and non-200 answers are
//! written to the log feed and turned into `None`.

use crate::error::FetchError;
use crate::newsroom::Newsroom;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// A fetched response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Transport used by [`fetch`]. Implementations return every response,
/// whatever its status; status validation happens in [`fetch`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError>;
}

/// `reqwest` client routed through a proxy.
#[derive(Debug, Clone)]
pub struct ProxiedClient {
    client: Client,
}

impl ProxiedClient {
    pub fn new(proxy_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let proxy = Proxy::all(proxy_url).map_err(|e| FetchError::Proxy {
            proxy: proxy_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Proxy {
                proxy: proxy_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ProxiedClient {
    async fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Page {
            url: url.to_string(),
            status,
            body,
        })
    }
}

/// Only `http` and `https` URLs can be requested.
pub fn check_scheme(url: &str) -> Result<(), FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::UnsupportedScheme {
            url: url.to_string(),
            scheme: other.to_string(),
        }),
    }
}

/// GET `url` with the current identity. Returns the page only on status 200.
#[instrument(level = "debug", skip(room))]
pub async fn fetch(room: &mut Newsroom, url: &str) -> Option<Page> {
    let identity = room.identity.next_identity();
    room.identity.record_use();

    if let Err(e) = check_scheme(url) {
        room.log.error(format!("Cannot request {url}: {e}"));
        return None;
    }

    match room.http.get(url, identity).await {
        Ok(page) if page.status == 200 => {
            debug!(bytes = page.body.len(), "Fetched page");
            Some(page)
        }
        Ok(page) => {
            room.log
                .warning(format!("Got response code ({}) from {url}", page.status));
            None
        }
        Err(e) => {
            room.log.error(format!("Request to {url} failed: {e}"));
            None
        }
    }
}

/// Pre-flight check: log the identity and egress address seen by the
/// outside world. Failures are only logged.
pub async fn check_connection(room: &mut Newsroom) {
    let urls = room.settings.connection_check_urls.clone();
    for url in urls {
        match fetch(room, &url).await {
            Some(page) => room.log.info(truncate_for_log(page.body.trim(), 300)),
            None => room
                .log
                .warning(format!("Connection check against {url} failed")),
        }
    }
}
