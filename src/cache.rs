//! Persistent key/value cache with optional per-key expiration.
//!
//! Entries are handled as explicit read-modify-write steps: read an entry
//! with [`get_item`], derive the new entry, and write it back with one of the
//! setters. The caller owns atomicity; a crawl cycle is the only writer.
//!
//! Two uses sit on top of this: the URL dedup list (see [`crate::dedup`])
//! and the translation quota counters ([`Quota`]).

use crate::error::CacheError;
use crate::store::CacheRepository;
use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Option<String>,
    pub expire_on: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            expire_on: None,
        }
    }

    /// True iff an expiration is set and it is not strictly in the future.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expire_on, Some(expire_on) if expire_on <= now)
    }

    /// The value parsed as a signed counter.
    pub fn counter(&self) -> Result<i64, CacheError> {
        self.value
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| CacheError::NotACounter {
                key: self.key.clone(),
                value: self.value.clone(),
            })
    }
}

/// Entry stored under `key`, if any. Expired entries are returned as-is;
/// readers decide with [`CacheEntry::is_expired`].
pub fn get_item<R>(repo: &R, key: &str) -> Option<CacheEntry>
where
    R: CacheRepository + ?Sized,
{
    repo.cache_entry(key)
}

/// Create `key` or update its value in place, keeping any expiration.
pub fn set_item<R>(repo: &mut R, key: &str, value: impl Into<String>) -> Result<CacheEntry, CacheError>
where
    R: CacheRepository + ?Sized,
{
    let entry = match repo.cache_entry(key) {
        Some(mut existing) => {
            existing.value = Some(value.into());
            existing
        }
        None => CacheEntry::new(key, value),
    };
    repo.put_cache_entry(entry.clone())?;
    Ok(entry)
}

pub fn set_value<R>(repo: &mut R, mut entry: CacheEntry, value: impl Into<String>) -> Result<CacheEntry, CacheError>
where
    R: CacheRepository + ?Sized,
{
    entry.value = Some(value.into());
    repo.put_cache_entry(entry.clone())?;
    Ok(entry)
}

/// Persist a new expiration for `entry`; `expire_on` must be after now.
pub fn set_expiration<R>(
    repo: &mut R,
    entry: CacheEntry,
    expire_on: DateTime<Utc>,
) -> Result<CacheEntry, CacheError>
where
    R: CacheRepository + ?Sized,
{
    set_expiration_at(repo, entry, expire_on, Utc::now())
}

pub fn set_expiration_at<R>(
    repo: &mut R,
    mut entry: CacheEntry,
    expire_on: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<CacheEntry, CacheError>
where
    R: CacheRepository + ?Sized,
{
    if expire_on <= now {
        return Err(CacheError::InvalidExpiration {
            key: entry.key,
            expire_on,
            now,
        });
    }
    entry.expire_on = Some(expire_on);
    repo.put_cache_entry(entry.clone())?;
    Ok(entry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaPeriod {
    Daily,
    Monthly,
}

impl QuotaPeriod {
    pub fn reset_after(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            QuotaPeriod::Daily => now.checked_add_days(Days::new(1)),
            QuotaPeriod::Monthly => now.checked_add_months(Months::new(1)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A usage allowance tracked as a counter under a fixed cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub key: &'static str,
    pub limit: u64,
    pub period: QuotaPeriod,
}

impl Quota {
    /// Remaining allowance, restarting the period when the counter is absent
    /// or expired.
    pub fn remaining<R>(&self, repo: &mut R, now: DateTime<Utc>) -> Result<i64, CacheError>
    where
        R: CacheRepository + ?Sized,
    {
        match get_item(repo, self.key) {
            Some(entry) if !entry.is_expired_at(now) => entry.counter(),
            _ => {
                debug!(key = self.key, limit = self.limit, "Resetting quota counter");
                let entry = set_item(repo, self.key, self.limit.to_string())?;
                set_expiration_at(repo, entry, self.period.reset_after(now), now)?;
                Ok(self.limit as i64)
            }
        }
    }

    /// Subtract `amount` from the counter and return what is left.
    pub fn consume<R>(&self, repo: &mut R, amount: u64) -> Result<i64, CacheError>
    where
        R: CacheRepository + ?Sized,
    {
        let entry = get_item(repo, self.key).ok_or_else(|| CacheError::NotACounter {
            key: self.key.to_string(),
            value: None,
        })?;
        let left = entry.counter()? - amount as i64;
        set_value(repo, entry, left.to_string())?;
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;
    use chrono::TimeDelta;

    #[test]
    fn test_entry_without_expiration_never_expires() {
        let entry = CacheEntry::new("k", "v");
        assert!(!entry.is_expired());
        assert!(!entry.is_expired_at(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let now = Utc::now();
        let mut entry = CacheEntry::new("k", "v");
        entry.expire_on = Some(now);
        assert!(entry.is_expired_at(now));
        entry.expire_on = Some(now + TimeDelta::seconds(1));
        assert!(!entry.is_expired_at(now));
        entry.expire_on = Some(now - TimeDelta::seconds(1));
        assert!(entry.is_expired_at(now));
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut store = JsonStore::in_memory();
        set_item(&mut store, "greeting", "hello").unwrap();
        let entry = get_item(&store, "greeting").unwrap();
        assert_eq!(entry.value.as_deref(), Some("hello"));
        assert!(get_item(&store, "missing").is_none());
    }

    #[test]
    fn test_set_expiration_rejects_now_and_past() {
        let mut store = JsonStore::in_memory();
        let now = Utc::now();
        let entry = set_item(&mut store, "k", "1").unwrap();

        let err = set_expiration_at(&mut store, entry.clone(), now, now).unwrap_err();
        assert!(matches!(err, CacheError::InvalidExpiration { .. }));
        let err = set_expiration_at(&mut store, entry.clone(), now - TimeDelta::hours(1), now)
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidExpiration { .. }));
        assert!(get_item(&store, "k").unwrap().expire_on.is_none());

        let later = now + TimeDelta::milliseconds(1);
        set_expiration_at(&mut store, entry, later, now).unwrap();
        assert_eq!(get_item(&store, "k").unwrap().expire_on, Some(later));
    }

    #[test]
    fn test_update_preserves_expiration() {
        let mut store = JsonStore::in_memory();
        let entry = set_item(&mut store, "k", "1").unwrap();
        let expire_on = Utc::now() + TimeDelta::days(2);
        set_expiration(&mut store, entry, expire_on).unwrap();
        let updated = set_item(&mut store, "k", "2").unwrap();
        assert_eq!(updated.value.as_deref(), Some("2"));
        assert_eq!(updated.expire_on, Some(expire_on));
    }

    #[test]
    fn test_quota_resets_when_absent() {
        let mut store = JsonStore::in_memory();
        let now = Utc::now();
        let quota = Quota {
            key: "words",
            limit: 1000,
            period: QuotaPeriod::Daily,
        };
        assert_eq!(quota.remaining(&mut store, now).unwrap(), 1000);
        let entry = get_item(&store, "words").unwrap();
        assert_eq!(entry.expire_on, Some(now + TimeDelta::days(1)));
    }

    #[test]
    fn test_quota_resets_when_expired_and_keeps_live_value() {
        let mut store = JsonStore::in_memory();
        let now = Utc::now();
        let quota = Quota {
            key: "chars",
            limit: 500,
            period: QuotaPeriod::Monthly,
        };
        store
            .put_cache_entry(CacheEntry {
                key: "chars".into(),
                value: Some("7".into()),
                expire_on: Some(now - TimeDelta::seconds(5)),
            })
            .unwrap();
        assert_eq!(quota.remaining(&mut store, now).unwrap(), 500);

        quota.consume(&mut store, 120).unwrap();
        assert_eq!(quota.remaining(&mut store, now).unwrap(), 380);
        assert!(get_item(&store, "chars").unwrap().expire_on.unwrap() > now + TimeDelta::days(27));
    }

    #[test]
    fn test_non_numeric_counter_is_an_error() {
        let mut store = JsonStore::in_memory();
        set_item(&mut store, "words", "lots").unwrap();
        let quota = Quota {
            key: "words",
            limit: 10,
            period: QuotaPeriod::Daily,
        };
        assert!(matches!(
            quota.remaining(&mut store, Utc::now()),
            Err(CacheError::NotACounter { .. })
        ));
    }
}
