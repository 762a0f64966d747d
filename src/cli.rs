//! Command-line interface definitions for the AI news digest.
//!
//! Output locations, credentials and the run mode come from flags or
//! environment variables; everything about *how* a run behaves lives in the
//! YAML config (see [`crate::config`]).

use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # One run, local files only
/// ai_news_digest -j ./json -m ./markdown --once
///
/// # Every morning at 08:30, publishing to Notion and Telegram
/// NOTION_API_KEY=... NOTION_DATABASE_ID=... \
/// TELEGRAM_BOT_TOKEN=... TELEGRAM_CHAT_ID=... \
/// ai_news_digest -j ./json -m ./markdown -c digest.yaml --daily-at 08:30
///
/// # Check how one page is extracted
/// ai_news_digest --test-url https://www.aitimes.com/news/articleView.html?idxno=1
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON summary files
    #[arg(short, long, default_value = "./json")]
    pub json_output_dir: String,

    /// Output directory for the Markdown reports
    #[arg(short, long, default_value = "./markdown")]
    pub markdown_output_dir: String,

    /// Optional path to the pipeline config YAML
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to the awful_aj config.yaml used by the `llm` summarizer
    #[arg(long)]
    pub llm_config: Option<String>,

    /// Notion integration token
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    pub notion_api_key: Option<String>,

    /// Notion database that receives report pages
    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub notion_database_id: Option<String>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat that receives digests and error notices
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Run every day at this local time (HH:MM), overriding the config file
    #[arg(long, value_name = "HH:MM", conflicts_with = "once")]
    pub daily_at: Option<String>,

    /// Run once and exit, even if the config file sets a daily time
    #[arg(long)]
    pub once: bool,

    /// Crawl a single URL, log what was extracted, and exit
    #[arg(long, value_name = "URL")]
    pub test_url: Option<String>,
}

impl Cli {
    /// Both Notion credentials, when both are set.
    pub fn notion(&self) -> Option<(&str, &str)> {
        both(&self.notion_api_key, &self.notion_database_id)
    }

    /// Both Telegram credentials, when both are set.
    pub fn telegram(&self) -> Option<(&str, &str)> {
        both(&self.telegram_bot_token, &self.telegram_chat_id)
    }
}

fn both<'a>(a: &'a Option<String>, b: &'a Option<String>) -> Option<(&'a str, &'a str)> {
    let a = a.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let b = b.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "ai_news_digest",
            "--json-output-dir",
            "./out/json",
            "--markdown-output-dir",
            "./out/md",
            "--daily-at",
            "08:30",
        ]);

        assert_eq!(cli.json_output_dir, "./out/json");
        assert_eq!(cli.markdown_output_dir, "./out/md");
        assert_eq!(cli.daily_at.as_deref(), Some("08:30"));
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_short_flags_and_defaults() {
        let cli = Cli::parse_from(["ai_news_digest", "-c", "digest.yaml"]);
        assert_eq!(cli.config.as_deref(), Some("digest.yaml"));
        assert_eq!(cli.json_output_dir, "./json");
        assert_eq!(cli.markdown_output_dir, "./markdown");
        assert!(cli.test_url.is_none());
    }

    #[test]
    fn test_once_conflicts_with_daily_at() {
        let result = Cli::try_parse_from(["ai_news_digest", "--once", "--daily-at", "08:30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sinks_need_both_credentials() {
        let cli = Cli::parse_from([
            "ai_news_digest",
            "--notion-api-key",
            "secret",
            "--telegram-bot-token",
            "123:abc",
            "--telegram-chat-id",
            "-100",
        ]);
        // The database id may still come from the environment.
        if std::env::var("NOTION_DATABASE_ID").is_err() {
            assert!(cli.notion().is_none());
        }
        assert_eq!(cli.telegram(), Some(("123:abc", "-100")));
    }

    #[test]
    fn test_blank_credentials_count_as_missing() {
        let a = Some("  ".to_string());
        let b = Some("x".to_string());
        assert_eq!(both(&a, &b), None);
        assert_eq!(both(&b, &b), Some(("x", "x")));
    }
}
