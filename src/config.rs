//! Pipeline configuration.
//!
//! Settings come from an optional YAML file (`--config`). Every field has a
//! default, so a missing file, an empty file or a partial section all yield a
//! working configuration. The file is read and validated once at startup and
//! the resulting [`AppConfig`] is passed by reference to each stage.
//!
//! ```yaml
//! feed:
//!   max_articles: 5
//! crawl:
//!   request_delay_ms: 1500
//!   selectors:
//!     - domain: example.co.kr
//!       selectors: [".story-body", "#article"]
//! tagging:
//!   sheet_csv_url: https://docs.google.com/spreadsheets/d/e/XYZ/pub?output=csv
//! summarizer:
//!   kind: llm
//! schedule:
//!   daily_at: "07:30"
//! ```

use crate::api::RetryPolicy;
use crate::error::ConfigError;
use crate::feed::FeedSettings;
use crate::scrapers::SelectorTable;
use crate::scrapers::extract::{DEFAULT_BODY_FALLBACK_CHARS, DEFAULT_MIN_CONTENT_CHARS};
use crate::schedule::parse_daily_at;
use crate::summarizer::SummarizerKind;
use crate::tagging::{CategoryRule, Tagger};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub crawl: CrawlConfig,
    pub tagging: TaggingConfig,
    pub summarizer: SummarizerConfig,
    pub report: ReportConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub language: String,
    pub country: String,
    /// Search terms used instead of the keyword vocabulary. Empty means the
    /// vocabulary (priority terms first) drives the search; its first five
    /// terms are OR-ed into the query.
    pub query_terms: Vec<String>,
    /// An item is kept only if its title or summary mentions one of these.
    pub relevance_terms: Vec<String>,
    pub max_articles: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com/rss/search".to_string(),
            language: "ko".to_string(),
            country: "KR".to_string(),
            query_terms: Vec::new(),
            relevance_terms: strings(&[
                "인공지능", "ai", "생성형ai", "chatgpt", "gpt", "llm", "머신러닝", "딥러닝",
                "신경망", "자율주행", "ai반도체", "네이버", "카카오", "삼성ai", "클로바",
            ]),
            max_articles: 10,
        }
    }
}

impl FeedConfig {
    /// The terms the feed is searched with: the override when set, else the vocabulary.
    pub fn search_terms<'a>(&'a self, vocabulary: &'a [String]) -> &'a [String] {
        if self.query_terms.iter().any(|t| !t.trim().is_empty()) {
            &self.query_terms
        } else {
            vocabulary
        }
    }

    pub fn settings(&self) -> FeedSettings {
        FeedSettings {
            base_url: self.base_url.clone(),
            language: self.language.clone(),
            country: self.country.clone(),
            relevance_terms: self.relevance_terms.clone(),
            max_articles: self.max_articles,
        }
    }
}

/// Extra content selectors for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSelectors {
    pub domain: String,
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Pause between two article fetches.
    pub request_delay_ms: u64,
    pub min_content_chars: usize,
    pub body_fallback_chars: usize,
    /// Checked before the built-in table; earlier entries win.
    pub selectors: Vec<SiteSelectors>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
            request_delay_ms: 1_000,
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
            body_fallback_chars: DEFAULT_BODY_FALLBACK_CHARS,
            selectors: Vec::new(),
        }
    }
}

impl CrawlConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Built-in table plus the configured sites, compiled.
    pub fn build_selector_table(&self) -> Result<SelectorTable, ConfigError> {
        let mut table = SelectorTable::with_builtin()?;
        // `register` puts entries in front, so insert in reverse to keep file order.
        for site in self.selectors.iter().rev() {
            table.register(&site.domain, &site.selectors)?;
        }
        Ok(table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Static vocabulary, also the fallback for the sheet source.
    pub vocabulary: Vec<String>,
    /// Moved to the front of the vocabulary, in this order.
    pub priority: Vec<String>,
    /// Checked in order; the first category with a hit wins.
    pub categories: Vec<CategoryRule>,
    pub default_category: String,
    /// Published CSV of a keyword spreadsheet. When set it replaces the
    /// static vocabulary unless it fails or is empty.
    pub sheet_csv_url: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        let rule = |name: &str, keywords: &[&str]| CategoryRule {
            name: name.to_string(),
            keywords: strings(keywords),
        };
        Self {
            vocabulary: strings(&[
                "artificial intelligence",
                "AI",
                "machine learning",
                "deep learning",
                "neural network",
                "ChatGPT",
                "OpenAI",
                "Google AI",
                "인공지능",
                "머신러닝",
                "딥러닝",
                "생성형 AI",
                "AI 기술",
                "LLM",
                "GPT",
            ]),
            priority: strings(&["AI", "인공지능", "ChatGPT", "생성형AI", "머신러닝"]),
            categories: vec![
                rule("생성형 AI", &["ChatGPT", "GPT", "LLM", "생성형"]),
                rule("AI 반도체", &["반도체", "GPU", "NPU", "엔비디아"]),
                rule("자율주행", &["자율주행"]),
                rule("AI 정책", &["규제", "정책", "법안"]),
                rule("기술", &["스타트업", "소프트웨어", "개발자", "블록체인"]),
            ],
            default_category: "AI 뉴스".to_string(),
            sheet_csv_url: None,
        }
    }
}

impl TaggingConfig {
    pub fn sheet_url(&self) -> Result<Option<Url>, ConfigError> {
        self.sheet_csv_url
            .as_deref()
            .map(|u| {
                Url::parse(u).map_err(|e| ConfigError::Invalid(format!("tagging.sheet_csv_url: {e}")))
            })
            .transpose()
    }

    pub fn tagger(&self, vocabulary: &[String]) -> Tagger {
        Tagger::new(vocabulary, &self.categories, &self.default_category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub kind: SummarizerKind,
    /// `awful_aj` template used by the `llm` backend.
    pub template: String,
    pub retry: RetryPolicy,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            kind: SummarizerKind::Lead,
            template: "news_summary".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Notion page titles are `"{title_prefix} - {date} {time}"`.
    pub title_prefix: String,
    /// Articles listed in the chat digest.
    pub digest_articles: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title_prefix: "Google News AI".to_string(),
            digest_articles: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// `HH:MM`; overridden by `--daily-at`.
    pub daily_at: Option<String>,
    /// Offset of the wall clock `daily_at` refers to, and of report timestamps.
    pub utc_offset_hours: i32,
    pub run_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: None,
            utc_offset_hours: 9,
            run_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Read the YAML file at `path`, or use the defaults when there is none.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!("Loaded config file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Startup checks. Nothing downstream re-validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.feed.max_articles == 0 {
            return invalid("feed.max_articles must be at least 1");
        }
        let blank = |terms: &[String]| terms.iter().all(|t| t.trim().is_empty());
        if blank(&self.feed.query_terms) && blank(&self.tagging.vocabulary) {
            return invalid("feed.query_terms or tagging.vocabulary must contain a term");
        }
        Url::parse(&self.feed.base_url)
            .map_err(|e| ConfigError::Invalid(format!("feed.base_url: {e}")))?;

        if self.crawl.request_timeout_secs == 0 {
            return invalid("crawl.request_timeout_secs must be positive");
        }
        self.crawl.build_selector_table()?;

        if self.tagging.categories.iter().any(|c| c.name.trim().is_empty()) {
            return invalid("tagging.categories entries need a name");
        }
        if self.tagging.default_category.trim().is_empty() {
            return invalid("tagging.default_category must not be empty");
        }
        self.tagging.sheet_url()?;

        if !(-12..=14).contains(&self.schedule.utc_offset_hours) {
            return invalid("schedule.utc_offset_hours must be between -12 and 14");
        }
        if self.schedule.run_timeout_secs == 0 {
            return invalid("schedule.run_timeout_secs must be positive");
        }
        if let Some(at) = &self.schedule.daily_at {
            parse_daily_at(at)?;
        }
        Ok(())
    }
}
