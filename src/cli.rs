//! Command-line interface definitions for newsdesk.
//!
//! Global options can be provided via command-line flags or environment
//! variables; each subcommand stands in for one operator action.

use clap::{Parser, Subcommand};

/// Command-line arguments for the newsdesk crawler.
///
/// # Examples
///
/// ```sh
/// # Register a topic and a sitemap source, then crawl
/// newsdesk add-topic Economy
/// newsdesk add-source --topic-id 1 --root-url https://x/sitemap.xml \
///     --url-filter https://x/2024 --language el
/// newsdesk crawl --log-output-dir ./logs
///
/// # Retry the editor on one article
/// WATSON_IAM_KEY=... newsdesk edit 42
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON store file
    #[arg(short, long, env = "NEWSDESK_STORE", default_value = "newsdesk.json", global = true)]
    pub store: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "NEWSDESK_CONFIG", global = true)]
    pub config: Option<String>,

    /// IBM Watson Language Translator API key
    #[arg(long, env = "WATSON_IAM_KEY", global = true)]
    pub watson_api_key: Option<String>,

    /// Proxy every page fetch goes through (overrides the config file)
    #[arg(long, env = "NEWSDESK_PROXY", global = true)]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run one crawl cycle over every active topic
    Crawl {
        /// Directory for the log feed snapshot
        #[arg(short, long)]
        log_output_dir: Option<String>,
    },
    /// Re-run the editor on one article
    Edit {
        /// Article id
        id: u64,
    },
    /// Create a topic
    AddTopic { title: String },
    /// Attach a source to a topic
    AddSource {
        #[arg(long)]
        topic_id: u64,
        /// Page or sitemap (ending in .xml) to discover links on
        #[arg(long)]
        root_url: String,
        /// Prefix every article URL of this source starts with
        #[arg(long)]
        url_filter: String,
        #[arg(long, value_parser = crate::models::LANGUAGES)]
        language: String,
    },
    DeactivateTopic { id: u64 },
    DeactivateSource { id: u64 },
    /// Delete a topic and its sources; refused while it has articles
    DeleteTopic { id: u64 },
    /// Print every topic as JSON
    Topics,
    /// Print stored articles as JSON
    Articles {
        /// Only articles the editor has finished
        #[arg(long)]
        ready: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "newsdesk",
            "--store",
            "/tmp/store.json",
            "crawl",
            "--log-output-dir",
            "./logs",
        ]);

        assert_eq!(cli.store, "/tmp/store.json");
        assert_eq!(
            cli.command,
            Command::Crawl {
                log_output_dir: Some("./logs".to_string())
            }
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["newsdesk", "edit", "7", "-c", "config.yaml"]);

        assert_eq!(cli.command, Command::Edit { id: 7 });
        assert_eq!(cli.config.as_deref(), Some("config.yaml"));
    }

    #[test]
    fn test_add_source_rejects_unknown_language() {
        let parsed = Cli::try_parse_from([
            "newsdesk",
            "add-source",
            "--topic-id",
            "1",
            "--root-url",
            "https://x/sitemap.xml",
            "--url-filter",
            "https://x/2024",
            "--language",
            "fr",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_articles_ready_flag() {
        let cli = Cli::parse_from(["newsdesk", "articles", "--ready"]);
        assert_eq!(cli.command, Command::Articles { ready: true });
    }
}
