//! Sequential article enrichment.
//!
//! [`Enricher::run`] walks a batch of stubs one at a time: fetch the linked
//! page, extract its content and images, stamp the outcome, then wait a fixed
//! delay before the next request. Items are never fetched concurrently; the
//! delay exists to stay under target-site rate limits.
//!
//! No per-item failure escapes: a failed fetch becomes an article with
//! [`CrawlStatus::Error`] whose content is the stub's feed summary.

use crate::error::FetchError;
use crate::models::{ArticleStub, BatchStats, CrawlStatus, EnrichedArticle};
use crate::scrapers::{Extraction, Extractor, PageFetcher};
use crate::utils::truncate_for_log;
use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Fetches and extracts a batch of stubs, keeping crawl statistics.
#[derive(Debug)]
pub struct Enricher<F> {
    fetcher: F,
    extractor: Extractor,
    request_delay: Duration,
    stats: BatchStats,
}

impl<F: PageFetcher> Enricher<F> {
    pub fn new(fetcher: F, extractor: Extractor, request_delay: Duration) -> Self {
        Self {
            fetcher,
            extractor,
            request_delay,
            stats: BatchStats::default(),
        }
    }

    /// Statistics of the most recent [`Self::run`].
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Enrich every stub, preserving input order. Returns exactly one article per stub.
    #[instrument(level = "info", skip_all, fields(count = stubs.len()))]
    pub async fn run(&mut self, stubs: Vec<ArticleStub>) -> Vec<EnrichedArticle> {
        self.stats = BatchStats {
            attempted: stubs.len(),
            ..BatchStats::default()
        };
        if stubs.is_empty() {
            info!("No stubs to enrich");
            return Vec::new();
        }

        let total = stubs.len();
        let mut articles = Vec::with_capacity(total);
        for (i, stub) in stubs.into_iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
            info!(
                index = i + 1,
                total,
                title = %truncate_for_log(&stub.title, 50),
                "Crawling article"
            );
            articles.push(self.enrich_one(stub).await);
        }

        info!(
            attempted = self.stats.attempted,
            succeeded = self.stats.succeeded,
            failed = self.stats.failed,
            fallback_used = self.stats.fallback_used,
            success_rate = %format!("{:.1}%", self.stats.success_rate()),
            "Crawl statistics"
        );
        articles
    }

    async fn enrich_one(&mut self, stub: ArticleStub) -> EnrichedArticle {
        match self.fetcher.fetch(&stub.link).await {
            Ok(markup) => {
                let extraction = self.extractor.extract(&markup, &stub.link);
                if extraction.strategy.is_fallback() {
                    self.stats.fallback_used += 1;
                }

                let status = if extraction.content.is_empty() {
                    self.stats.failed += 1;
                    warn!(url = %stub.link, "No content extracted");
                    CrawlStatus::Failed
                } else {
                    self.stats.succeeded += 1;
                    info!(
                        url = %stub.link,
                        chars = extraction.content.chars().count(),
                        strategy = ?extraction.strategy,
                        "Crawl succeeded"
                    );
                    CrawlStatus::Success
                };
                EnrichedArticle::new(
                    stub,
                    extraction.content,
                    extraction.images,
                    status,
                    Utc::now(),
                )
            }
            Err(e) => {
                self.stats.failed += 1;
                error!(url = %stub.link, error = %e, "Crawl failed; using feed summary");
                let content = stub.raw_summary.clone();
                EnrichedArticle::new(stub, content, Vec::new(), CrawlStatus::Error, Utc::now())
            }
        }
    }

    /// Fetch and extract a single URL without touching the batch statistics.
    pub async fn probe(&self, url: &Url) -> Result<Extraction, FetchError> {
        let markup = self.fetcher.fetch(url).await?;
        Ok(self.extractor.extract(&markup, url))
    }
}
