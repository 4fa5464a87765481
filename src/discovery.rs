//! Candidate URL discovery for a single source.
//!
//! A source whose root URL ends in `.xml` is read as a sitemap (`<loc>`
//! elements); anything else is read as HTML (`<a href>` attributes). A link
//! becomes a [`Candidate`] when it starts with the source's literal filter,
//! sorts after the filter itself (which skips the listing page the filter
//! names), and is not in the dedup list.

use crate::dedup::Blacklist;
use crate::fetcher;
use crate::models::{Candidate, Source};
use crate::newsroom::Newsroom;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Text of every `<loc>` element in a sitemap or sitemap index.
pub fn sitemap_locations(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locations = Vec::new();
    let mut in_loc = false;
    let mut raw = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                raw.clear();
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let unescaped = quick_xml::escape::unescape(raw.trim())
                    .map(|text| text.into_owned())
                    .unwrap_or_else(|_| raw.trim().to_string());
                if !unescaped.is_empty() {
                    locations.push(unescaped);
                }
            }
            Event::Text(t) if in_loc => raw.push_str(&String::from_utf8_lossy(&t)),
            Event::CData(t) if in_loc => raw.push_str(&String::from_utf8_lossy(&t)),
            Event::GeneralRef(r) if in_loc => {
                raw.push('&');
                raw.push_str(&String::from_utf8_lossy(&r));
                raw.push(';');
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(locations)
}

/// Every `href` attribute of an anchor in an HTML page.
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Whether `link` should be scraped for a source with `url_filter`.
pub fn accept_link(link: &str, url_filter: &str, blacklist: &Blacklist) -> bool {
    link.starts_with(url_filter) && link > url_filter && !blacklist.contains(link)
}

fn extract_links(source: &Source, body: &str) -> Result<Vec<String>, quick_xml::Error> {
    if source.root_url.ends_with(".xml") {
        sitemap_locations(body)
    } else {
        Ok(anchor_hrefs(body))
    }
}

/// New `(url, language)` candidates offered by `source`.
#[instrument(level = "info", skip_all, fields(root_url = %source.root_url))]
pub async fn discover(room: &mut Newsroom, source: &Source) -> BTreeSet<Candidate> {
    let mut candidates = BTreeSet::new();

    let blacklist = match Blacklist::load(&mut *room.store) {
        Ok(blacklist) => blacklist,
        Err(e) => {
            room.log.error(format!("Cannot read the URL blacklist: {e}"));
            return candidates;
        }
    };

    debug!(known = blacklist.len(), "Loaded URL blacklist");
    room.log.info(format!("Checking {}", source.root_url));
    let Some(page) = fetcher::fetch(room, &source.root_url).await else {
        room.log
            .warning(format!("Found nothing new in {}", source.root_url));
        return candidates;
    };

    match extract_links(source, &page.body) {
        Ok(links) => {
            if links.is_empty() {
                room.log.warning("No links were found in this page.");
            }
            debug!(links = links.len(), "Parsed source page");
            candidates.extend(
                links
                    .into_iter()
                    .filter(|link| accept_link(link, &source.url_filter, &blacklist))
                    .map(|link| Candidate::new(link, source.language.clone())),
            );
        }
        Err(e) => room.log.warning(format!("Cannot parse this page: {e}")),
    }

    if candidates.is_empty() {
        room.log
            .warning(format!("Found nothing new in {}", source.root_url));
    }
    candidates
}
