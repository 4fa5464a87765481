//! One crawl cycle over every active topic, plus manual re-enrichment.
//!
//! A cycle never fails as a whole: each stage logs its own problems to the
//! feed and the cycle moves on to the next URL.

use crate::discovery;
use crate::editor::Editor;
use crate::error::StoreError;
use crate::extraction;
use crate::fetcher;
use crate::models::{Article, Candidate, NewArticle, Topic};
use crate::newsroom::Newsroom;
use crate::store::{ArticleRepository, TopicRepository};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Counters for one cycle, logged by the `crawl` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub discovered: usize,
    pub created: usize,
    pub enriched: usize,
    /// Candidates that matched an article already in the store.
    pub existing: usize,
    /// Candidates that could not be fetched, parsed, or were too short.
    pub rejected: usize,
    /// Integrity conflicts and articles the editor could not finish.
    pub failed: usize,
}

#[instrument(level = "info", skip_all)]
pub async fn run_cycle(room: &mut Newsroom, editor: &Editor) -> CycleReport {
    let mut report = CycleReport::default();
    fetcher::check_connection(room).await;

    // Discovery for every topic runs before any article is fetched.
    let mut discovered = Vec::new();
    for topic in room.store.active_topics() {
        let candidates = gather(room, &topic).await;
        report.discovered += candidates.len();
        discovered.push((topic, candidates));
    }

    for (topic, candidates) in discovered {
        for candidate in candidates {
            process(room, editor, &topic, candidate, &mut report).await;
        }
    }

    room.log.info("Finished scraping.");
    info!(?report, "Crawl cycle finished");
    report
}

/// Union of the candidates offered by the topic's active sources.
async fn gather(room: &mut Newsroom, topic: &Topic) -> BTreeSet<Candidate> {
    let mut candidates = BTreeSet::new();
    for source in room.store.active_sources(topic.id) {
        candidates.extend(discovery::discover(room, &source).await);
    }
    candidates
}

async fn process(
    room: &mut Newsroom,
    editor: &Editor,
    topic: &Topic,
    candidate: Candidate,
    report: &mut CycleReport,
) {
    if let Some(existing) = room.store.article_by_source(&candidate.url) {
        report.existing += 1;
        room.log
            .warning(format!("Article already exists: {}", candidate.url));
        if !existing.is_ready() {
            finish(room, editor, existing, report).await;
        }
        return;
    }

    let min_words = room.settings.min_words_to_scrape;
    let Some(draft) = extraction::extract(room, &candidate.url, min_words).await else {
        report.rejected += 1;
        return;
    };

    let created = room.store.create_article(NewArticle {
        topic_id: topic.id,
        source: draft.url,
        original_title: draft.title,
        original_text: draft.text,
        original_language: candidate.language,
    });
    match created {
        Ok(article) => {
            report.created += 1;
            room.log
                .info(format!("Saved new article: {}", article.original_title));
            finish(room, editor, article, report).await;
        }
        Err(e) => {
            report.failed += 1;
            room.log.error(format!("Cannot save {}: {e}", candidate.url));
        }
    }
}

async fn finish(room: &mut Newsroom, editor: &Editor, article: Article, report: &mut CycleReport) {
    match editor.enrich(room, article).await {
        Some(article) if article.is_ready() => report.enriched += 1,
        _ => report.failed += 1,
    }
}

/// Re-run the editor on one stored article.
pub async fn edit_article(
    room: &mut Newsroom,
    editor: &Editor,
    id: u64,
) -> Result<Option<Article>, StoreError> {
    let article = room
        .store
        .article(id)
        .ok_or(StoreError::NotFound { kind: "article", id })?;
    Ok(editor.enrich(room, article).await)
}
