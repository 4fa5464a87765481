//! The pipeline context shared by every stage of a crawl cycle.

use crate::config::Settings;
use crate::fetcher::HttpClient;
use crate::identity::IdentityRotation;
use crate::log_feed::LogFeed;
use crate::store::Store;

/// Single owner of all mutable cycle state. Stages borrow it mutably one at
/// a time, so a cycle never runs concurrently with another.
pub struct Newsroom {
    pub store: Box<dyn Store>,
    pub http: Box<dyn HttpClient>,
    pub identity: IdentityRotation,
    pub log: LogFeed,
    pub settings: Settings,
}

impl Newsroom {
    pub fn new(store: Box<dyn Store>, http: Box<dyn HttpClient>, settings: Settings) -> Self {
        Self {
            store,
            http,
            identity: IdentityRotation::new(),
            log: LogFeed::new(settings.log_capacity),
            settings,
        }
    }
}
