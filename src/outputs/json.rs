//! JSON snapshot of the log feed.
//!
//! Files are organized by date with edition names, one file per edition
//! (a later crawl in the same edition overwrites the earlier snapshot):
//! ```text
//! log_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```

use crate::log_feed::{LogFeed, LogRecord};
use crate::utils::time_of_day;
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Body served by the log feed endpoint.
#[derive(Debug, Serialize)]
pub struct FeedSnapshot<'a> {
    pub status: &'static str,
    pub log: &'a [LogRecord],
}

impl<'a> FeedSnapshot<'a> {
    pub fn of(feed: &'a LogFeed) -> Self {
        Self {
            status: "OK",
            log: feed.records(),
        }
    }
}

/// Write the feed to `{log_output_dir}/{date}/{time_of_day}.json` and return
/// the path written.
#[instrument(level = "info", skip_all, fields(log_output_dir = %log_output_dir))]
pub async fn write_log_feed(
    feed: &LogFeed,
    log_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&FeedSnapshot::of(feed))?;

    let full_json_dir = PathBuf::from(log_output_dir).join(Local::now().date_naive().to_string());
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join(format!("{}.json", time_of_day()));
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename.display(), records = feed.len(), "Wrote log feed");

    Ok(output_json_filename)
}
