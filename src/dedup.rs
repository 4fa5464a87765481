//! URL dedup list kept in the cache under [`BLACKLIST_KEY`].
//!
//! The value is an append-only list of every URL that was ever parsed,
//! joined with `", "`, so discovery never hands the same page to extraction
//! twice. Only the full separator splits entries: a bare comma is legal
//! inside a URL.

use crate::cache::{self, CacheEntry};
use crate::error::CacheError;
use crate::store::CacheRepository;
use std::collections::HashSet;

pub const BLACKLIST_KEY: &str = "url_blacklist";
const SEPARATOR: &str = ", ";

/// Snapshot of the dedup list for fast membership checks.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    urls: HashSet<String>,
}

impl Blacklist {
    /// Load the list, creating an empty entry when none exists yet.
    pub fn load<R>(repo: &mut R) -> Result<Self, CacheError>
    where
        R: CacheRepository + ?Sized,
    {
        let entry = match cache::get_item(repo, BLACKLIST_KEY) {
            Some(entry) => entry,
            None => cache::set_item(repo, BLACKLIST_KEY, "")?,
        };
        Ok(Self::from_entry(&entry))
    }

    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            urls: members(entry.value.as_deref().unwrap_or_default())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

fn members(value: &str) -> impl Iterator<Item = &str> {
    value.split(SEPARATOR).map(str::trim).filter(|u| !u.is_empty())
}

/// Append `url` to the dedup list. Returns `false` if it was already there.
pub fn add_url<R>(repo: &mut R, url: &str) -> Result<bool, CacheError>
where
    R: CacheRepository + ?Sized,
{
    let Some(entry) = cache::get_item(repo, BLACKLIST_KEY) else {
        cache::set_item(repo, BLACKLIST_KEY, url)?;
        return Ok(true);
    };
    let current = entry.value.clone().unwrap_or_default();
    if members(&current).any(|member| member == url) {
        return Ok(false);
    }
    let value = if current.trim().is_empty() {
        url.to_string()
    } else {
        format!("{current}{SEPARATOR}{url}")
    };
    cache::set_value(repo, entry, value)?;
    Ok(true)
}

/// Whether `url` is already recorded.
#[cfg(test)]
pub fn is_known<R>(repo: &R, url: &str) -> bool
where
    R: CacheRepository + ?Sized,
{
    cache::get_item(repo, BLACKLIST_KEY)
        .is_some_and(|entry| members(entry.value.as_deref().unwrap_or_default()).any(|m| m == url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    #[test]
    fn test_load_creates_empty_entry() {
        let mut store = JsonStore::in_memory();
        let blacklist = Blacklist::load(&mut store).unwrap();
        assert_eq!(blacklist.len(), 0);
        assert_eq!(
            cache::get_item(&store, BLACKLIST_KEY).unwrap().value.as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_add_appends_once() {
        let mut store = JsonStore::in_memory();
        assert!(add_url(&mut store, "https://x/2024/a").unwrap());
        assert!(add_url(&mut store, "https://x/2024/b").unwrap());
        assert!(!add_url(&mut store, "https://x/2024/a").unwrap());
        assert_eq!(
            cache::get_item(&store, BLACKLIST_KEY).unwrap().value.as_deref(),
            Some("https://x/2024/a, https://x/2024/b")
        );
    }

    #[test]
    fn test_membership_is_whole_entry_not_substring() {
        let mut store = JsonStore::in_memory();
        add_url(&mut store, "https://x/2024/article-long").unwrap();
        let blacklist = Blacklist::load(&mut store).unwrap();
        assert!(blacklist.contains("https://x/2024/article-long"));
        assert!(!blacklist.contains("https://x/2024/article"));
        assert!(!is_known(&store, "https://x/2024/article"));
    }

    #[test]
    fn test_url_with_comma_is_one_entry() {
        let mut store = JsonStore::in_memory();
        assert!(add_url(&mut store, "https://x/news/a,b").unwrap());
        assert!(!add_url(&mut store, "https://x/news/a,b").unwrap());
        assert_eq!(
            cache::get_item(&store, BLACKLIST_KEY).unwrap().value.as_deref(),
            Some("https://x/news/a,b")
        );

        let blacklist = Blacklist::load(&mut store).unwrap();
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.contains("https://x/news/a,b"));
        assert!(!blacklist.contains("https://x/news/a"));
        assert!(!blacklist.contains("b"));
    }

    #[test]
    fn test_add_after_empty_load_has_no_leading_separator() {
        let mut store = JsonStore::in_memory();
        Blacklist::load(&mut store).unwrap();
        add_url(&mut store, "https://x/one").unwrap();
        assert_eq!(
            cache::get_item(&store, BLACKLIST_KEY).unwrap().value.as_deref(),
            Some("https://x/one")
        );
        assert_eq!(Blacklist::load(&mut store).unwrap().len(), 1);
    }
}
