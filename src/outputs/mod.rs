//! Files written for operators after a crawl.
//!
//! - [`json`]: snapshot of the log feed, one file per date and edition

pub mod json;
