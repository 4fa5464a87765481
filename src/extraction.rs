//! Article extraction from a fetched page.
//!
//! The page is downloaded through the proxied fetcher (never by the parser
//! itself). `readability` picks the main content node; its paragraphs become
//! the article text. The title comes from the page metadata.

use crate::dedup;
use crate::error::ParseError;
use crate::fetcher;
use crate::models::ArticleDraft;
use crate::newsroom::Newsroom;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use readability::extractor;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArticle {
    pub title: String,
    pub text: String,
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize(&element.text().collect::<String>())
}

/// og:title, then `<title>`, then the first `<h1>`.
fn find_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let og = document
        .select(&OG_TITLE)
        .filter_map(|meta| meta.value().attr("content"))
        .map(normalize)
        .find(|t| !t.is_empty());
    og.or_else(|| {
        document
            .select(&TITLE)
            .chain(document.select(&HEADLINE))
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

/// Paragraph text of the readable content, one blank line between paragraphs.
fn paragraphs(content: &str) -> String {
    let fragment = Html::parse_fragment(content);
    fragment
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Best-effort title and body text of the article page at `url`.
///
/// A page with text but no title still parses; the title is empty then.
pub fn parse_article(html: &str, url: &str) -> Result<ParsedArticle, ParseError> {
    let base = Url::parse(url).map_err(|e| ParseError::Unreadable(e.to_string()))?;
    let product = extractor::extract(&mut html.as_bytes(), &base)
        .map_err(|e| ParseError::Unreadable(e.to_string()))?;

    let title = find_title(html).unwrap_or_else(|| normalize(&product.title));
    let mut text = paragraphs(&product.content);
    if text.is_empty() {
        text = normalize(&product.text);
    }

    if title.is_empty() && text.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(ParsedArticle { title, text })
}

/// Fetch and parse `url`. Every parsed URL lands in the dedup list, but only
/// titled drafts with at least `min_words` words are returned.
#[instrument(level = "info", skip(room))]
pub async fn extract(room: &mut Newsroom, url: &str, min_words: usize) -> Option<ArticleDraft> {
    let page = fetcher::fetch(room, url).await?;

    let parsed = match parse_article(&page.body, &page.url) {
        Ok(parsed) => parsed,
        Err(e) => {
            room.log.error(format!("Cannot parse article {url}: {e}"));
            return None;
        }
    };

    if let Err(e) = dedup::add_url(&mut *room.store, url) {
        room.log.error(format!("Cannot blacklist {url}: {e}"));
    }

    let draft = ArticleDraft {
        url: page.url,
        title: parsed.title,
        text: parsed.text,
    };
    if draft.title.is_empty() {
        room.log.info(format!("Skipping untitled page {url}"));
        return None;
    }
    let words = draft.word_count();
    if words < min_words {
        room.log.info(format!(
            "Skipping {} ({words} words, minimum {min_words})",
            truncate_for_log(&draft.title, 80)
        ));
        return None;
    }
    debug!(words, "Extracted article");
    Some(draft)
}
