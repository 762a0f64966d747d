//! Rendering and local files for a finished batch.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`BatchSummary`] as JSON for API consumption
//! - [`markdown`]: Renders the report as a Markdown document
//! - [`digest`]: Short HTML messages for the chat channel
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 0730.json
//!     └── 1900.json
//!
//! markdown_output_dir/
//! ├── 2025-05-06_0730.md
//! └── 2025-05-06_1900.md
//! ```
//!
//! All dates and times are shown in the configured UTC offset.

use crate::models::{BatchSummary, EnrichedArticle};
use chrono::FixedOffset;

pub mod digest;
pub mod json;
pub mod markdown;

/// Shown when an article has no publication time.
pub const UNKNOWN_DATE: &str = "날짜 미상";

/// Local date and time labels for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    /// `HHMM`, used in file names.
    pub compact_time: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub full: String,
}

impl Stamp {
    pub fn of(summary: &BatchSummary, offset: FixedOffset) -> Self {
        let local = summary.generated_at.with_timezone(&offset);
        Self {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M").to_string(),
            compact_time: local.format("%H%M").to_string(),
            full: local.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// `"{prefix} - {date} {time}"`
pub fn report_title(prefix: &str, stamp: &Stamp) -> String {
    format!("{prefix} - {} {}", stamp.date, stamp.time)
}

/// Publication time as `YYYY-MM-DD HH:MM` in `offset`.
pub fn published_label(article: &EnrichedArticle, offset: FixedOffset) -> String {
    article
        .stub
        .published_at
        .map(|d| d.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{
        ArticleStub, BatchStats, BatchSummary, CrawlStatus, EnrichedArticle,
    };
    use crate::report::summarize;
    use chrono::{TimeZone, Utc};

    pub fn article(title: &str, source: &str, hour: Option<u32>, keywords: &[&str]) -> EnrichedArticle {
        let published = hour.map(|h| Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap());
        let stub = ArticleStub::new(
            title,
            &format!("https://example.com/{}", title.len()),
            published,
            source,
            "feed summary",
        )
        .unwrap();
        let mut a = EnrichedArticle::new(
            stub,
            "Samsung unveiled a new AI chip for phones on Saturday. It ships next year.".to_string(),
            vec![],
            CrawlStatus::Success,
            Utc::now(),
        );
        a.summary = "Samsung unveiled a new AI chip for phones on Saturday.".to_string();
        a.set_tags(
            keywords.iter().map(|s| s.to_string()).collect(),
            "AI 반도체".to_string(),
        );
        a
    }

    /// Two articles, generated 2025-03-01 22:30 UTC (07:30 next day in +09:00).
    pub fn summary() -> BatchSummary {
        summarize(
            vec![
                article("Samsung <AI> chip", "전자신문", Some(1), &["AI"]),
                article("OpenAI & GPT news", "Example", Some(3), &["AI", "GPT"]),
            ],
            BatchStats {
                attempted: 2,
                succeeded: 2,
                failed: 0,
                fallback_used: 0,
            },
            Utc.with_ymd_and_hms(2025, 3, 1, 22, 30, 0).unwrap(),
        )
    }
}
