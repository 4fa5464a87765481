//! # newsdesk
//!
//! A news crawler that discovers article links on registered sources,
//! scrapes the pages through an anonymizing proxy, and turns each article
//! into an English title, a short summary and a keyword list.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk crawl --log-output-dir ./logs
//! ```
//!
//! ## Architecture
//!
//! One crawl cycle runs the stages in order, one URL at a time:
//! 1. **Discovery**: read each active source (sitemap or HTML page) for new links
//! 2. **Extraction**: fetch and parse each new link into a draft article
//! 3. **Storage**: persist drafts, skipping duplicates
//! 4. **Editing**: summarize, translate into English, extract keywords
//!
//! All cycle state (store, transport, rotated identity, log feed) lives in a
//! single [`newsroom::Newsroom`] passed down the call chain.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod dedup;
mod discovery;
mod editor;
mod error;
mod extraction;
mod fetcher;
mod identity;
mod log_feed;
mod models;
mod newsroom;
mod outputs;
mod pipeline;
mod store;
#[cfg(test)]
mod testing;
mod text;
mod translate;
mod utils;

use cli::{Cli, Command};
use config::Settings;
use editor::Editor;
use fetcher::ProxiedClient;
use models::NewSource;
use newsroom::Newsroom;
use outputs::json;
use store::{ArticleRepository, JsonStore, TopicRepository};
use utils::ensure_writable_dir;

/// File settings with CLI/environment values layered on top.
fn load_settings(args: &Cli) -> Result<Settings, Box<dyn Error>> {
    let mut settings = Settings::load(args.config.as_deref().map(Path::new))?;
    if let Some(key) = &args.watson_api_key {
        settings.watson.api_key = Some(key.clone());
    }
    if let Some(proxy) = &args.proxy {
        settings.proxy_url = proxy.clone();
    }
    Ok(settings)
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsdesk starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.command, store = %args.store, "Parsed CLI arguments");

    let settings = load_settings(&args)?;
    let store = JsonStore::open(&args.store)?;
    let http = ProxiedClient::new(
        &settings.proxy_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    info!(proxy = %settings.proxy_url, "Fetcher ready");
    let mut room = Newsroom::new(Box::new(store), Box::new(http), settings);

    match args.command {
        Command::Crawl { log_output_dir } => {
            // Early check: ensure the snapshot dir is writable before crawling
            if let Some(dir) = &log_output_dir {
                if let Err(e) = ensure_writable_dir(dir).await {
                    error!(
                        path = %dir,
                        error = %e,
                        "Log output directory is not writable (fix perms or choose a different path)"
                    );
                    return Err(e);
                }
            }

            let editor = Editor::from_settings(&room.settings);
            let report = pipeline::run_cycle(&mut room, &editor).await;
            info!(
                discovered = report.discovered,
                created = report.created,
                enriched = report.enriched,
                existing = report.existing,
                rejected = report.rejected,
                failed = report.failed,
                "Crawl report"
            );

            if let Some(dir) = &log_output_dir {
                if let Err(e) = json::write_log_feed(&room.log, dir).await {
                    error!(error = %e, "Failed to write log feed snapshot");
                }
            }
        }
        Command::Edit { id } => {
            let editor = Editor::from_settings(&room.settings);
            match pipeline::edit_article(&mut room, &editor, id).await? {
                Some(article) if article.is_ready() => {
                    println!("{}", serde_json::to_string_pretty(&article)?);
                }
                _ => warn!(id, "Article was not finished; see the log above"),
            }
        }
        Command::AddTopic { title } => {
            let topic = room.store.create_topic(&title)?;
            info!(id = topic.id, title = %topic.title, "Created topic");
            println!("{}", serde_json::to_string_pretty(&topic)?);
        }
        Command::AddSource {
            topic_id,
            root_url,
            url_filter,
            language,
        } => {
            let source = room.store.create_source(NewSource {
                topic_id,
                root_url,
                url_filter,
                language,
            })?;
            info!(id = source.id, topic_id, root_url = %source.root_url, "Created source");
            println!("{}", serde_json::to_string_pretty(&source)?);
        }
        Command::DeactivateTopic { id } => {
            let topic = room.store.set_topic_active(id, false)?;
            info!(id, title = %topic.title, "Deactivated topic");
        }
        Command::DeactivateSource { id } => {
            let source = room.store.set_source_active(id, false)?;
            info!(id, root_url = %source.root_url, "Deactivated source");
        }
        Command::DeleteTopic { id } => {
            room.store.delete_topic(id)?;
            info!(id, "Deleted topic");
        }
        Command::Topics => {
            println!("{}", serde_json::to_string_pretty(&room.store.topics())?);
        }
        Command::Articles { ready } => {
            let articles: Vec<_> = room
                .store
                .articles()
                .into_iter()
                .filter(|article| !ready || article.is_ready())
                .collect();
            info!(count = articles.len(), "Listing articles");
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
