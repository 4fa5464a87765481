//! Enrichment: summary, English title, keywords, then `Ready`.

use crate::config::Settings;
use crate::models::{Article, ENGLISH};
use crate::newsroom::Newsroom;
use crate::store::ArticleRepository;
use crate::text::{keywords, split_sentences, summarize};
use crate::translate::{LanguagePair, Translator};
use itertools::Itertools;
use tracing::{debug, instrument};

pub struct Editor {
    translator: Translator,
    ratio: f64,
    keyword_count: usize,
}

impl Editor {
    pub fn new(translator: Translator, ratio: f64, keyword_count: usize) -> Self {
        Self {
            translator,
            ratio,
            keyword_count,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Translator::from_settings(settings),
            settings.summarize_ratio,
            settings.keyword_count,
        )
    }

    /// Summarize, translate when needed, and persist `article` as `Ready`.
    ///
    /// Returns `None` when translation or persistence failed; the stored
    /// article is untouched in that case. An article whose text yields no
    /// summary is returned unchanged and still `New`.
    #[instrument(level = "info", skip_all, fields(id = article.id))]
    pub async fn enrich(&self, room: &mut Newsroom, article: Article) -> Option<Article> {
        room.log.info(format!("Editing {}", article.original_title));
        let mut summary = summarize(&article.original_text, self.ratio);

        let title = if article.needs_translation() {
            let pair = LanguagePair::new(article.original_language.clone(), ENGLISH);
            let translated = match self
                .translator
                .translate_this(room, &article.original_title, &pair)
                .await
            {
                Ok(title) => title,
                Err(e) => {
                    room.log.error(format!("Translation failed: {e}"));
                    return None;
                }
            };
            if let Some(text) = summary.take() {
                match self.translator.translate_this(room, &text, &pair).await {
                    Ok(translated) => summary = translated,
                    Err(e) => {
                        room.log.error(format!("Translation failed: {e}"));
                        return None;
                    }
                }
            }
            translated
        } else {
            article.title.clone()
        };

        let Some(summary) = summary else {
            room.log.error("Could not finish editing the article.");
            return Some(article);
        };

        let html = split_sentences(&summary)
            .iter()
            .map(|sentence| format!("<p>{sentence}</p>"))
            .join("");
        let keywords = keywords(&summary, self.keyword_count).join(", ");
        debug!(keywords = %keywords, "Summary ready");

        let mut edited = article;
        edited.publish(title, html, keywords);
        if let Err(e) = room.store.save_article(&edited) {
            room.log
                .error(format!("Cannot save article {}: {e}", edited.id));
            return None;
        }
        room.log.info("Editing finished successfully!");
        Some(edited)
    }
}
