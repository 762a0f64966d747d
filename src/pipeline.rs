//! One end-to-end run.
//!
//! ```text
//! vocabulary -> feed -> enrich -> summarize -> tag -> report
//!     -> JSON + Markdown files -> document sink -> notification
//! ```
//!
//! Every stage processes its items one at a time. Only two conditions end a
//! run early ([`PipelineError`]): the feed is unreachable or it returns no
//! articles. Everything else degrades the report instead of failing it.

use crate::config::AppConfig;
use crate::enrich::Enricher;
use crate::error::PipelineError;
use crate::feed::GoogleNewsFeed;
use crate::keywords::{KeywordSource, load_vocabulary};
use crate::models::BatchSummary;
use crate::outputs::digest::{digest_html, error_notice};
use crate::outputs::{Stamp, json, markdown};
use crate::report::summarize;
use crate::scrapers::{Extractor, PageFetcher};
use crate::sinks::{DocumentSink, NotificationSink};
use crate::summarizer::{Summarizer, batch_overview, summarize_all};
use chrono::{FixedOffset, Utc};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Where local report files go.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub json: String,
    pub markdown: String,
}

/// What happened to a report after it was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Link returned by the document sink.
    pub published: Option<String>,
    /// Whether a message reached the notification sink.
    pub notified: bool,
}

/// All collaborators of a run. Generic so tests can swap in fakes.
pub struct Pipeline<'a, F, K, S, D, N> {
    pub config: &'a AppConfig,
    pub outputs: OutputDirs,
    pub offset: FixedOffset,
    pub fetcher: F,
    pub extractor: Extractor,
    pub keywords: K,
    pub summarizer: S,
    pub document_sink: Option<D>,
    pub notifier: Option<N>,
}

impl<F, K, S, D, N> Pipeline<'_, F, K, S, D, N>
where
    F: PageFetcher + Clone,
    K: KeywordSource,
    S: Summarizer,
    D: DocumentSink,
    N: NotificationSink,
{
    /// Collect, enrich, report and deliver. Returns the report that was built.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Result<BatchSummary, PipelineError> {
        let t0 = Instant::now();
        let config = self.config;

        let vocabulary = load_vocabulary(
            &self.keywords,
            &config.tagging.vocabulary,
            &config.tagging.priority,
        )
        .await;

        let feed = GoogleNewsFeed::new(self.fetcher.clone(), config.feed.settings());
        let stubs = feed.collect(config.feed.search_terms(&vocabulary)).await?;
        if stubs.is_empty() {
            warn!("Feed returned no articles");
            return Err(PipelineError::NoArticles);
        }

        let mut enricher = Enricher::new(
            self.fetcher.clone(),
            self.extractor.clone(),
            config.crawl.request_delay(),
        );
        let mut articles = enricher.run(stubs).await;

        summarize_all(&self.summarizer, &mut articles).await;

        let tagger = config.tagging.tagger(&vocabulary);
        info!(terms = tagger.vocabulary_len(), "Tagging with vocabulary");
        for article in articles.iter_mut() {
            tagger.apply(article);
        }

        let mut summary = summarize(articles, enricher.stats(), Utc::now());
        summary.overview = batch_overview(&self.summarizer, &summary.articles).await;
        self.write_outputs(&summary).await;
        let delivery = self.deliver(&summary).await;

        let elapsed = t0.elapsed();
        info!(
            articles = summary.total_articles,
            published = delivery.published.is_some(),
            notified = delivery.notified,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Run complete"
        );
        Ok(summary)
    }

    /// JSON and Markdown files. Failures are logged; the run continues.
    async fn write_outputs(&self, summary: &BatchSummary) {
        let stamp = Stamp::of(summary, self.offset);

        if let Err(e) = json::write_summary(summary, &stamp, &self.outputs.json).await {
            error!(error = %e, "Failed to write JSON");
        }

        let md = markdown::summary_to_markdown(
            summary,
            &self.config.report.title_prefix,
            &stamp,
            self.offset,
        );
        if let Err(e) = markdown::write_report(&md, &stamp, &self.outputs.markdown).await {
            error!(error = %e, "Failed to write Markdown");
        }
    }

    pub async fn deliver(&self, summary: &BatchSummary) -> Delivery {
        deliver(
            summary,
            self.document_sink.as_ref(),
            self.notifier.as_ref(),
            self.offset,
            self.config.report.digest_articles,
        )
        .await
    }

    /// Send an error notice for a failed run, if a notifier is configured.
    pub async fn notify_failure(&self, reason: &str) -> bool {
        send_error_notice(self.notifier.as_ref(), reason, self.offset).await
    }
}

/// Publish the report, then announce it.
///
/// On publish success the digest carries the link; on publish failure an
/// error notice goes out instead. A missing document sink still gets a
/// digest, without a link. Sink errors never propagate.
#[instrument(level = "info", skip_all)]
pub async fn deliver<D: DocumentSink, N: NotificationSink>(
    summary: &BatchSummary,
    document_sink: Option<&D>,
    notifier: Option<&N>,
    offset: FixedOffset,
    digest_articles: usize,
) -> Delivery {
    let published = match document_sink {
        None => {
            info!("No document sink configured; skipping publish");
            Ok(None)
        }
        Some(sink) => match sink.publish(summary).await {
            Ok(url) => {
                info!(%url, "Report published");
                Ok(Some(url))
            }
            Err(e) => {
                error!(error = %e, "Publishing failed");
                Err(e)
            }
        },
    };

    let notified = match &published {
        Ok(url) => {
            let stamp = Stamp::of(summary, offset);
            let digest = digest_html(summary, url.as_deref(), &stamp, offset, digest_articles);
            send(notifier, &digest).await
        }
        Err(e) => send_error_notice(notifier, &format!("리포트 저장 실패: {e}"), offset).await,
    };

    Delivery {
        published: published.ok().flatten(),
        notified,
    }
}

async fn send_error_notice<N: NotificationSink>(
    notifier: Option<&N>,
    reason: &str,
    offset: FixedOffset,
) -> bool {
    let at = Utc::now().with_timezone(&offset);
    send(notifier, &error_notice(reason, at)).await
}

async fn send<N: NotificationSink>(notifier: Option<&N>, html: &str) -> bool {
    let Some(notifier) = notifier else {
        info!("No notifier configured; skipping message");
        return false;
    };
    match notifier.notify(html).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Notification failed");
            false
        }
    }
}
