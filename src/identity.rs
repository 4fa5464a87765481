//! Rotating client identity (the `User-Agent` header sent with every fetch).
//!
//! An identity is kept for a random number of uses between
//! [`MIN_USES`] and [`MAX_USES`], then replaced by another one drawn from
//! the pool.

use rand::{Rng, rng};
use tracing::debug;

pub const MIN_USES: u32 = 5;
pub const MAX_USES: u32 = 10;

pub static USER_AGENTS: &[&str] = &[
    // Chrome - Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.169 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/72.0.3626.121 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.169 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3865.75 Safari/537.36",
    // IE
    "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; rv:11.0) like Gecko",
    // Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:60.0) Gecko/20100101 Firefox/60.0",
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:54.0) Gecko/20100101 Firefox/54.0",
    // Opera
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Safari/537.36 OPR/56.0.3051.52",
    // Mac OS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3865.75 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1.1 Safari/605.1.15",
    // Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3865.75 Safari/537.36",
    // Android
    "Mozilla/5.0 (Linux; Android 9; SM-G960F Build/PPR1.180610.011; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/74.0.3729.157 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 7.0; SM-G570M Build/NRD90M) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Mobile Safari/537.36",
    // iOS
    "Mozilla/5.0 (iPhone; CPU iPhone OS 12_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/77.0.3865.69 Mobile/15E148 Safari/605.1",
    "Mozilla/5.0 (iPad; CPU OS 12_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1 Mobile/15E148 Safari/604.1",
];

#[derive(Debug, Clone)]
pub struct IdentityRotation {
    pool: &'static [&'static str],
    current: Option<&'static str>,
    uses: u32,
    threshold: u32,
}

impl IdentityRotation {
    pub fn new() -> Self {
        Self::with_pool(USER_AGENTS)
    }

    /// An empty pool is replaced by the built-in one.
    pub fn with_pool(pool: &'static [&'static str]) -> Self {
        Self {
            pool: if pool.is_empty() { USER_AGENTS } else { pool },
            current: None,
            uses: 0,
            threshold: MIN_USES,
        }
    }

    /// Identity for the next request, rotating it once its use budget is spent.
    pub fn next_identity(&mut self) -> &'static str {
        match self.current {
            Some(current) if self.uses < self.threshold => current,
            _ => self.rotate(),
        }
    }

    /// Count one request made with the current identity.
    pub fn record_use(&mut self) {
        self.uses += 1;
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    pub fn uses(&self) -> u32 {
        self.uses
    }

    fn rotate(&mut self) -> &'static str {
        let mut rng = rng();
        let fresh: Vec<&'static str> = self
            .pool
            .iter()
            .copied()
            .filter(|agent| Some(*agent) != self.current)
            .collect();
        let candidate = match fresh.len() {
            0 => self.pool[0],
            n => fresh[rng.random_range(0..n)],
        };

        if self.current.is_some() {
            debug!(uses = self.uses, "Rotating client identity");
        }
        self.current = Some(candidate);
        self.uses = 0;
        self.threshold = rng.random_range(MIN_USES..=MAX_USES);
        candidate
    }
}

impl Default for IdentityRotation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAIR: &[&str] = &["agent-a", "agent-b"];

    #[test]
    fn test_first_call_draws_from_pool() {
        let mut identity = IdentityRotation::with_pool(PAIR);
        assert!(identity.current().is_none());
        let first = identity.next_identity();
        assert!(PAIR.contains(&first));
        assert_eq!(identity.uses(), 0);
    }

    #[test]
    fn test_identity_kept_below_minimum_uses() {
        let mut identity = IdentityRotation::with_pool(PAIR);
        let first = identity.next_identity();
        for _ in 0..(MIN_USES - 1) {
            identity.record_use();
            assert_eq!(identity.next_identity(), first);
        }
    }

    #[test]
    fn test_identity_rotates_by_maximum_uses() {
        let mut identity = IdentityRotation::with_pool(PAIR);
        let first = identity.next_identity();
        let mut rotated = None;
        for _ in 0..MAX_USES {
            identity.record_use();
            let next = identity.next_identity();
            if next != first {
                rotated = Some(next);
                break;
            }
        }
        assert_eq!(rotated, Some(if first == "agent-a" { "agent-b" } else { "agent-a" }));
        assert_eq!(identity.uses(), 0);
    }

    #[test]
    fn test_empty_pool_falls_back_to_builtin() {
        let mut identity = IdentityRotation::with_pool(&[]);
        assert!(USER_AGENTS.contains(&identity.next_identity()));
    }
}
