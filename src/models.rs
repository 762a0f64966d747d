//! Data models for article records and batch results.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`ArticleStub`]: Minimal article record produced by the feed source
//! - [`EnrichedArticle`]: A stub plus scraped content, images, summary and tags
//! - [`BatchStats`]: Per-run crawl counters
//! - [`BatchSummary`]: Everything the sinks need to render a report
//!
//! The size limits on images and keywords, and the `content_length` bookkeeping,
//! are enforced by the constructors and setters of [`EnrichedArticle`], which is
//! why those fields are private.

use crate::error::StubError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Maximum number of images kept per article.
pub const MAX_IMAGES: usize = 5;

/// Maximum number of keyword tags kept per article.
pub const MAX_KEYWORDS: usize = 5;

/// A minimal article record as delivered by the feed.
///
/// Construct with [`ArticleStub::new`], which validates the required fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleStub {
    pub title: String,
    pub link: Url,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub raw_summary: String,
}

impl ArticleStub {
    /// Validate and build a stub.
    ///
    /// The title must be non-blank and the link must be an absolute `http` or
    /// `https` URL. A blank source becomes `"Unknown"`.
    pub fn new(
        title: &str,
        link: &str,
        published_at: Option<DateTime<Utc>>,
        source: &str,
        raw_summary: &str,
    ) -> Result<Self, StubError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StubError::EmptyTitle);
        }

        let link = Url::parse(link.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| StubError::InvalidLink(link.to_string()))?;

        let source = source.trim();
        Ok(Self {
            title: title.to_string(),
            link,
            published_at,
            source: if source.is_empty() {
                "Unknown".to_string()
            } else {
                source.to_string()
            },
            raw_summary: raw_summary.trim().to_string(),
        })
    }
}

/// An image found on an article page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute image URL.
    pub url: String,
    pub alt_text: String,
    pub title_text: String,
}

/// Outcome of the crawl for one article. Terminal once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Page fetched and non-empty content extracted.
    Success,
    /// Page fetched but nothing cleared the extraction thresholds.
    Failed,
    /// The fetch itself failed; content holds the stub's summary.
    Error,
}

/// A stub after enrichment.
///
/// Invariants: `content_length() == content().chars().count()`,
/// `images().len() <= MAX_IMAGES`, `keywords().len() <= MAX_KEYWORDS`.
/// Only [`EnrichedArticle::new`] builds one, so there is no `Deserialize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedArticle {
    #[serde(flatten)]
    pub stub: ArticleStub,
    content: String,
    content_length: usize,
    images: Vec<ImageRef>,
    pub crawl_status: CrawlStatus,
    pub crawled_at: DateTime<Utc>,
    /// Short summary produced by the configured summarizer.
    pub summary: String,
    keywords: Vec<String>,
    pub category: String,
}

impl EnrichedArticle {
    /// Build a record from a crawl outcome. Images beyond [`MAX_IMAGES`] are dropped.
    pub fn new(
        stub: ArticleStub,
        content: String,
        mut images: Vec<ImageRef>,
        crawl_status: CrawlStatus,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        images.truncate(MAX_IMAGES);
        let content_length = content.chars().count();
        Self {
            stub,
            content,
            content_length,
            images,
            crawl_status,
            crawled_at,
            summary: String::new(),
            keywords: Vec::new(),
            category: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length of [`Self::content`] in characters.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Assign tags; keywords beyond [`MAX_KEYWORDS`] are dropped.
    pub fn set_tags(&mut self, mut keywords: Vec<String>, category: String) {
        keywords.truncate(MAX_KEYWORDS);
        self.keywords = keywords;
        self.category = category;
    }

    /// The text tags are derived from: title followed by the summary.
    pub fn tagging_text(&self) -> String {
        format!("{} {}", self.stub.title, self.summary)
    }
}

/// Crawl counters for a single enrichment run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub fallback_used: usize,
}

impl BatchStats {
    /// Success rate in percent, `0.0` for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64 * 100.0
        }
    }
}

/// Earliest and latest publication time among the articles of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// The per-run report handed to the outputs and sinks. Read-only once built.
///
/// Serialize-only, like [`EnrichedArticle`]: reports are written, never read back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    /// One-line trend summary of the batch.
    pub overview: String,
    /// Frequency-ranked keywords, at most ten.
    pub top_keywords: Vec<String>,
    /// Articles ordered most recent first.
    pub articles: Vec<EnrichedArticle>,
    pub total_articles: usize,
    pub distinct_sources: Vec<String>,
    pub total_sources: usize,
    pub keywords_found_count: usize,
    pub avg_content_length: usize,
    pub date_range: Option<DateRange>,
    pub stats: BatchStats,
}
