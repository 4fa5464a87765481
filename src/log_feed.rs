//! Bounded in-memory log feed shown to operators.
//!
//! Records are kept newest-first. Every write is mirrored to `tracing`
//! so the terminal log and the feed never disagree.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    #[serde(rename = "msg")]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogFeed {
    records: Vec<LogRecord>,
    capacity: usize,
}

impl LogFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "newsdesk::feed", "{message}");
        self.push(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "newsdesk::feed", "{message}");
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(target: "newsdesk::feed", "{message}");
        self.push(LogLevel::Error, message);
    }

    /// Records, newest first.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if any record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    fn push(&mut self, level: LogLevel, message: String) {
        let stamped = format!(
            "{} - {} ==> {}",
            Local::now().format("%d-%m, %H:%M:%S"),
            level.as_str(),
            message
        );
        self.records.insert(
            0,
            LogRecord {
                level,
                message: stamped,
            },
        );
        self.records.truncate(self.capacity);
    }
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_record_first() {
        let mut feed = LogFeed::new(10);
        feed.info("first");
        feed.warning("second");
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.records()[0].level, LogLevel::Warning);
        assert!(feed.records()[0].message.ends_with("WARNING ==> second"));
        assert!(feed.records()[1].message.ends_with("INFO ==> first"));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut feed = LogFeed::new(3);
        for i in 0..5 {
            feed.info(format!("entry {i}"));
        }
        assert_eq!(feed.len(), 3);
        assert!(feed.contains(LogLevel::Info, "entry 4"));
        assert!(!feed.contains(LogLevel::Info, "entry 1"));
    }

    #[test]
    fn test_serializes_like_feed_endpoint() {
        let mut feed = LogFeed::new(3);
        feed.error("boom");
        let json = serde_json::to_value(feed.records()).unwrap();
        assert_eq!(json[0]["level"], "ERROR");
        assert!(json[0]["msg"].as_str().unwrap().contains("boom"));
    }
}
